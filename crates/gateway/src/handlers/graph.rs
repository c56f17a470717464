//! Graph build handler

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Instant;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::AppState;
use litgraph_common::{
    cache::keys,
    errors::{AppError, Result},
    metrics,
};
use litgraph_graph::{render, BuildRequest, ExportFormat};

const CACHE_NAME: &str = "graph";

/// Graph build request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GraphRequest {
    #[validate(length(min = 1, max = 1000))]
    pub query: String,

    /// Seed publications taken from the search index
    #[serde(default)]
    #[validate(range(min = 1, max = 1000))]
    pub n_starting_nodes: Option<usize>,

    /// Citation hops away from the seeds
    #[serde(default)]
    #[validate(range(max = 5))]
    pub n_hops: Option<usize>,

    #[serde(default)]
    pub min_ngram_lift: Option<f64>,

    #[serde(default)]
    pub min_topic_score: Option<f64>,

    /// Publications to leave out of the graph
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub format: ExportFormat,
}

/// Cache identity of a request: its normalized build parameters and format
#[derive(Serialize)]
struct CacheIdentity<'a> {
    request: &'a BuildRequest,
    format: &'a str,
}

impl GraphRequest {
    /// Engine request with the query whitespace-collapsed and lowercased and
    /// the exclusions sorted and deduplicated, so equivalent requests share
    /// a cache entry
    pub fn normalized(&self) -> BuildRequest {
        let query = self
            .query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let mut exclude: Vec<String> = self
            .exclude
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        exclude.sort();
        exclude.dedup();

        BuildRequest {
            query,
            n_starting_nodes: self.n_starting_nodes,
            n_hops: self.n_hops,
            min_ngram_lift: self.min_ngram_lift,
            min_topic_score: self.min_topic_score,
            exclude,
        }
    }
}

/// Hex SHA-256 of the normalized request
pub fn request_hash(request: &BuildRequest, format: ExportFormat) -> Result<String> {
    let identity = CacheIdentity {
        request,
        format: format.as_str(),
    };
    let bytes = serde_json::to_vec(&identity)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Build a relevance graph for a query and return it in the requested format
pub async fn build_graph(
    State(state): State<AppState>,
    Json(request): Json<GraphRequest>,
) -> Result<Response> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let format = request.format;
    let build = request.normalized();
    if build.query.is_empty() {
        return Err(AppError::Validation {
            message: "query must contain at least one non-whitespace character".to_string(),
            field: Some("query".to_string()),
        });
    }

    let cache_key = keys::graph(&request_hash(&build, format)?, format.as_str());

    if let Some(cache) = &state.cache {
        match cache.get_export(&cache_key).await {
            Ok(Some(body)) => {
                metrics::record_cache(true, CACHE_NAME);
                debug!(key = %cache_key, "Serving graph from cache");
                return Ok(graph_response(body, format));
            }
            Ok(None) => metrics::record_cache(false, CACHE_NAME),
            Err(e) => warn!(error = %e, "Cache read failed, building graph"),
        }
    }

    let graph = state.engine.build(&build).await?;
    let body = render(&graph, format)?;

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.put_export(&cache_key, &body).await {
            warn!(error = %e, "Failed to cache graph");
        }
    }

    info!(
        query = %build.query,
        format = format.as_str(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Graph request served"
    );

    Ok(graph_response(body, format))
}

fn graph_response(body: String, format: ExportFormat) -> Response {
    (
        [(header::CONTENT_TYPE, HeaderValue::from_static(format.content_type()))],
        body,
    )
        .into_response()
}
