//! LitGraph HTTP Gateway
//!
//! Serves multi-layer relevance graph builds over HTTP.
//! Handles:
//! - Corpus snapshot loading at startup
//! - Request validation and optional Redis result caching
//! - Observability (structured logging, Prometheus metrics)

mod handlers;
mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use litgraph_common::{
    cache::Cache,
    config::{AppConfig, ObservabilityConfig},
    db::{DbPool, Repository},
    metrics::{self, BUILD_BUCKETS, METRICS_PREFIX},
};
use litgraph_graph::{GraphEngine, PgCorpus};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::{limit::ConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<GraphEngine>,
    pub repo: Repository,
    pub cache: Option<Arc<Cache>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    let config = Arc::new(config);

    init_tracing(&config.observability);
    info!("Starting LitGraph Gateway v{}", litgraph_common::VERSION);

    // Initialize metrics
    if config.observability.metrics_port > 0 {
        install_metrics(config.observability.metrics_port)?;
        metrics::register_metrics();
    }

    // Initialize database connection
    let db = DbPool::new(&config.database).await?;
    let repo = Repository::new(db);

    // Load the corpus snapshot once; every build reads it
    let corpus = Arc::new(PgCorpus::new(repo.clone()));
    let engine = GraphEngine::load(config.graph.clone(), corpus.clone(), corpus).await?;

    // Initialize Redis cache (optional)
    let cache = match &config.redis {
        Some(redis) => match Cache::new(redis.clone()).await {
            Ok(cache) => {
                info!("Redis cache connected");
                Some(Arc::new(cache))
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect to Redis, caching disabled");
                None
            }
        },
        None => {
            info!("No Redis configured, caching disabled");
            None
        }
    };

    let state = AppState {
        config: config.clone(),
        engine: Arc::new(engine),
        repo,
        cache,
    };

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// JSON or human-readable logs, filtered by `RUST_LOG` or the configured level
fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&observability.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logging {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Install the Prometheus recorder with its own scrape listener
fn install_metrics(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_graph_build_duration_seconds", METRICS_PREFIX)),
            BUILD_BUCKETS,
        )?
        .install()?;
    info!("Prometheus metrics on {}", addr);
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = state.config.request_timeout();
    let max_concurrent = state.config.server.max_concurrent_requests;

    let api_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/graph", post(handlers::graph::build_graph));

    Router::new()
        .nest("/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::metrics::track_requests))
                .layer(TimeoutLayer::new(timeout))
                .layer(ConcurrencyLimitLayer::new(max_concurrent)),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
