//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::future::Future;
use std::time::Instant;

use crate::AppState;
use litgraph_common::errors::Result;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub database: CheckResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CheckResult>,
    pub snapshot: SnapshotStats,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Size of the corpus snapshot the engine serves from
#[derive(Serialize)]
pub struct SnapshotStats {
    pub papers: usize,
    pub citations: usize,
}

impl CheckResult {
    async fn run(check: impl Future<Output = Result<()>>) -> Self {
        let start = Instant::now();
        match check.await {
            Ok(()) => Self {
                status: "up".to_string(),
                latency_ms: Some(start.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => Self {
                status: "down".to_string(),
                latency_ms: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn is_up(&self) -> bool {
        self.status == "up"
    }
}

/// Liveness check - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: litgraph_common::VERSION,
    })
}

/// Readiness check - checks the database and, when configured, the cache
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let database = CheckResult::run(state.repo.ping()).await;

    let cache = match &state.cache {
        Some(cache) => Some(CheckResult::run(cache.ping()).await),
        None => None,
    };

    // the cache is optional; only the database gates readiness
    let ready = database.is_up();
    let adjacency = state.engine.snapshot().adjacency();

    Json(ReadyResponse {
        status: if ready { "ready" } else { "not_ready" }.to_string(),
        checks: HealthChecks {
            database,
            cache,
            snapshot: SnapshotStats {
                papers: adjacency.node_count(),
                citations: adjacency.edge_count(),
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use litgraph_common::AppError;

    #[tokio::test]
    async fn test_health_reports_version() {
        let Json(body) = health().await;
        assert_eq!(body.status, "healthy");
        assert_eq!(body.version, litgraph_common::VERSION);
    }

    #[tokio::test]
    async fn test_check_outcomes() {
        let up = CheckResult::run(async { Ok::<(), AppError>(()) }).await;
        assert!(up.is_up());
        assert!(up.latency_ms.is_some());

        let down = CheckResult::run(async { Err::<(), _>(AppError::config("unreachable")) }).await;
        assert!(!down.is_up());
        assert!(down.error.unwrap().contains("unreachable"));
        assert!(down.latency_ms.is_none());
    }
}
