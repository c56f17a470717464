//! Configuration management for LitGraph services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Redis configuration (graph cache is disabled when absent)
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Graph engine configuration
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds (bounds a whole graph build)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum concurrent requests
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    /// Redis URL
    pub url: String,

    /// Default TTL in seconds
    #[serde(default = "default_redis_ttl")]
    pub default_ttl_secs: u64,

    /// Key prefix for namespacing
    #[serde(default = "default_redis_prefix")]
    pub key_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error) or a full env-filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// Which keyword rows feed the keyword layer.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMode {
    /// Statistical n-grams above the TF-IDF floor (`doc_ngrams`)
    Ngrams,
    /// Only keywords extracted from the paper itself
    Extracted,
    /// Only derived keywords above the TF-IDF floor
    Extended,
    /// Every keyword above the TF-IDF floor
    Both,
}

/// Co-occurrence statistic used to derive item-item edges.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CooccurrenceStatistic {
    Lift,
    Interest,
}

/// Where co-authorship counts come from.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoauthorshipSource {
    /// Pre-aggregated `coauthorships` table
    Cached,
    /// Self-join over `authorships`
    Computed,
}

/// How citation edges are weighted.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CitationWeighting {
    /// Constant weight of 1.0
    Uniform,
    /// Query similarity against per-paper sidecar TF-IDF files
    SidecarContexts,
    /// Query similarity against contexts vectorized from the store
    StoreContexts,
}

/// Selection of a document's most relevant topics.
///
/// Exactly one criterion is given, so asking for both or neither cannot be
/// expressed.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SelectBy {
    /// The `n` topics with the largest share
    TopN(usize),
    /// Every topic whose share is strictly greater than the value
    Threshold(f64),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContextsConfig {
    /// Sidecar path with an `{id}` placeholder for the citing paper
    pub path_template: Option<String>,

    /// Vocabulary file used to weight query tokens
    pub vocabulary_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopicsConfig {
    /// Include the topic layer
    #[serde(default)]
    pub enabled: bool,

    /// Per-document topic selection
    #[serde(default = "default_topic_selection")]
    pub selection: SelectBy,

    /// Statistic for topic-topic edges
    #[serde(default = "default_topic_statistic")]
    pub statistic: CooccurrenceStatistic,

    /// Minimum score a topic rule needs to become an edge
    #[serde(default)]
    pub min_score: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphConfig {
    /// Seed publications fetched from the search index
    #[serde(default = "default_starting_nodes")]
    pub n_starting_nodes: usize,

    /// Citation hops followed from the seeds
    #[serde(default = "default_hops")]
    pub n_hops: usize,

    /// Search index fields matched against the query
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<String>,

    /// Keyword rows to use; has no default and must be configured
    pub keyword_mode: KeywordMode,

    /// TF-IDF floor for n-grams and derived keywords
    #[serde(default = "default_min_ngram_tfidf")]
    pub min_ngram_tfidf: f64,

    /// Minimum score for keyword-keyword edges
    #[serde(default = "default_min_ngram_lift")]
    pub min_ngram_lift: f64,

    /// Statistic for keyword-keyword edges
    #[serde(default = "default_keyword_statistic")]
    pub keyword_statistic: CooccurrenceStatistic,

    /// Source of co-authorship counts
    #[serde(default = "default_coauthorship_source")]
    pub coauthorship_source: CoauthorshipSource,

    /// Citation edge weighting strategy
    #[serde(default = "default_citation_weighting")]
    pub citation_weighting: CitationWeighting,

    /// Attach display attributes (titles, names, labels) to nodes
    #[serde(default)]
    pub include_attributes: bool,

    /// Sidecar context files
    #[serde(default = "default_contexts")]
    pub contexts: ContextsConfig,

    /// Topic layer
    #[serde(default = "default_topics")]
    pub topics: TopicsConfig,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 120 }
fn default_max_concurrent() -> usize { 16 }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_redis_ttl() -> u64 { 3600 }
fn default_redis_prefix() -> String { "litgraph".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_starting_nodes() -> usize { 50 }
fn default_hops() -> usize { 2 }
fn default_search_fields() -> Vec<String> { vec!["title".to_string(), "abstract".to_string()] }
fn default_min_ngram_tfidf() -> f64 { 0.25 }
fn default_min_ngram_lift() -> f64 { 1.0 }
fn default_keyword_statistic() -> CooccurrenceStatistic { CooccurrenceStatistic::Lift }
fn default_topic_statistic() -> CooccurrenceStatistic { CooccurrenceStatistic::Interest }
fn default_topic_selection() -> SelectBy { SelectBy::TopN(5) }
fn default_coauthorship_source() -> CoauthorshipSource { CoauthorshipSource::Cached }
fn default_citation_weighting() -> CitationWeighting { CitationWeighting::Uniform }
fn default_contexts() -> ContextsConfig { ContextsConfig { path_template: None, vocabulary_path: None } }
fn default_topics() -> TopicsConfig {
    TopicsConfig {
        enabled: false,
        selection: default_topic_selection(),
        statistic: default_topic_statistic(),
        min_score: 0.0,
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__GRAPH__N_HOPS=3
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl GraphConfig {
    /// Reject parameter combinations the engine cannot build with
    pub fn validate(&self) -> Result<()> {
        if self.n_starting_nodes == 0 {
            return Err(AppError::config("graph.n_starting_nodes must be positive"));
        }
        if self.search_fields.is_empty() {
            return Err(AppError::config("graph.search_fields must name at least one field"));
        }
        if self.min_ngram_tfidf < 0.0 || !self.min_ngram_tfidf.is_finite() {
            return Err(AppError::config("graph.min_ngram_tfidf must be a non-negative number"));
        }
        if self.min_ngram_lift < 0.0 || !self.min_ngram_lift.is_finite() {
            return Err(AppError::config("graph.min_ngram_lift must be a non-negative number"));
        }
        if self.topics.min_score < 0.0 || !self.topics.min_score.is_finite() {
            return Err(AppError::config("graph.topics.min_score must be a non-negative number"));
        }
        if self.citation_weighting == CitationWeighting::SidecarContexts {
            let template = self.contexts.path_template.as_deref().ok_or_else(|| {
                AppError::config("graph.contexts.path_template is required for sidecar_contexts")
            })?;
            if !template.contains("{id}") {
                return Err(AppError::config(
                    "graph.contexts.path_template must contain an {id} placeholder",
                ));
            }
        }
        match self.topics.selection {
            SelectBy::TopN(0) => {
                return Err(AppError::config("graph.topics.selection top_n must be positive"))
            }
            SelectBy::Threshold(x) if !x.is_finite() => {
                return Err(AppError::config("graph.topics.selection threshold must be finite"))
            }
            _ => {}
        }
        Ok(())
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            n_starting_nodes: default_starting_nodes(),
            n_hops: default_hops(),
            search_fields: default_search_fields(),
            keyword_mode: KeywordMode::Ngrams,
            min_ngram_tfidf: default_min_ngram_tfidf(),
            min_ngram_lift: default_min_ngram_lift(),
            keyword_statistic: default_keyword_statistic(),
            coauthorship_source: default_coauthorship_source(),
            citation_weighting: default_citation_weighting(),
            include_attributes: false,
            contexts: default_contexts(),
            topics: default_topics(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                max_concurrent_requests: default_max_concurrent(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/litgraph".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            redis: None,
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                metrics_port: default_metrics_port(),
            },
            graph: GraphConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.graph.n_hops, 2);
        assert_eq!(config.graph.min_ngram_tfidf, 0.25);
        assert!(config.graph.validate().is_ok());
    }

    #[test]
    fn test_sidecar_requires_template() {
        let mut graph = GraphConfig::default();
        graph.citation_weighting = CitationWeighting::SidecarContexts;
        assert!(graph.validate().is_err());

        graph.contexts.path_template = Some("/data/contexts/{id}.txt".to_string());
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_topic_selection() {
        let mut graph = GraphConfig::default();
        graph.topics.selection = SelectBy::TopN(0);
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_cooccurrence_thresholds() {
        let mut graph = GraphConfig::default();
        graph.topics.min_score = -1.0;
        assert!(graph.validate().is_err());

        let mut graph = GraphConfig::default();
        graph.min_ngram_lift = -0.1;
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_keyword_mode_has_no_default() {
        let parsed: std::result::Result<GraphConfig, _> = serde_json::from_str("{}");
        assert!(parsed.is_err());

        let parsed: GraphConfig =
            serde_json::from_str(r#"{"keyword_mode": "extended", "topics": {"selection": {"threshold": 0.1}}}"#)
                .unwrap();
        assert_eq!(parsed.keyword_mode, KeywordMode::Extended);
        assert_eq!(parsed.topics.selection, SelectBy::Threshold(0.1));
    }
}
