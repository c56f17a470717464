//! Graph builds over a loaded corpus snapshot
//!
//! The engine owns the read-only snapshot and the collaborators. `build`
//! runs the layers one after the other and assembles the result; it is
//! async only because the collaborators are.

use crate::assembler::{assemble, GraphLayers, RelevanceGraph};
use crate::attributes::LayerAttributes;
use crate::collab::{CorpusStore, SearchIndex};
use crate::layers::{
    build_author_layer, build_keyword_layer, build_publication_layer, build_topic_layer,
    build_venue_layer, KeywordParams, PublicationQuery, TopicParams,
};
use crate::model::PubId;
use crate::snapshot::CorpusSnapshot;
use crate::weighting::{create_weighter, CitationWeighter};
use litgraph_common::config::GraphConfig;
use litgraph_common::errors::{AppError, Result};
use litgraph_common::metrics;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// One graph request; unset overrides fall back to the engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub query: String,

    #[serde(default)]
    pub n_starting_nodes: Option<usize>,

    #[serde(default)]
    pub n_hops: Option<usize>,

    #[serde(default)]
    pub min_ngram_lift: Option<f64>,

    #[serde(default)]
    pub min_topic_score: Option<f64>,

    /// Publications that must not appear in the graph
    #[serde(default)]
    pub exclude: Vec<PubId>,
}

impl BuildRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// Request merged with the engine configuration
#[derive(Debug, Clone)]
struct BuildParams {
    n_starting_nodes: usize,
    n_hops: usize,
    min_ngram_lift: f64,
    min_topic_score: f64,
    exclude: HashSet<PubId>,
}

impl BuildParams {
    fn resolve(config: &GraphConfig, request: &BuildRequest) -> Result<Self> {
        if request.query.trim().is_empty() {
            return Err(AppError::Validation {
                message: "Query must not be empty".to_string(),
                field: Some("query".to_string()),
            });
        }

        let params = Self {
            n_starting_nodes: request.n_starting_nodes.unwrap_or(config.n_starting_nodes),
            n_hops: request.n_hops.unwrap_or(config.n_hops),
            min_ngram_lift: request.min_ngram_lift.unwrap_or(config.min_ngram_lift),
            min_topic_score: request.min_topic_score.unwrap_or(config.topics.min_score),
            exclude: request.exclude.iter().cloned().collect(),
        };

        if params.n_starting_nodes == 0 {
            return Err(AppError::Validation {
                message: "n_starting_nodes must be positive".to_string(),
                field: Some("n_starting_nodes".to_string()),
            });
        }
        for (field, value) in [
            ("min_ngram_lift", params.min_ngram_lift),
            ("min_topic_score", params.min_topic_score),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(AppError::Validation {
                    message: format!("{} must be a non-negative number", field),
                    field: Some(field.to_string()),
                });
            }
        }

        Ok(params)
    }
}

/// Multi-layer relevance graph builder
#[derive(Clone)]
pub struct GraphEngine {
    config: GraphConfig,
    store: Arc<dyn CorpusStore>,
    index: Arc<dyn SearchIndex>,
    snapshot: Arc<CorpusSnapshot>,
    weighter: Arc<dyn CitationWeighter>,
}

impl GraphEngine {
    pub fn new(
        config: GraphConfig,
        store: Arc<dyn CorpusStore>,
        index: Arc<dyn SearchIndex>,
        snapshot: Arc<CorpusSnapshot>,
        weighter: Arc<dyn CitationWeighter>,
    ) -> Self {
        Self {
            config,
            store,
            index,
            snapshot,
            weighter,
        }
    }

    /// Validate the configuration, load the snapshot and pick the citation
    /// weighting strategy
    pub async fn load(
        config: GraphConfig,
        store: Arc<dyn CorpusStore>,
        index: Arc<dyn SearchIndex>,
    ) -> Result<Self> {
        config.validate()?;

        let snapshot = Arc::new(CorpusSnapshot::load(store.as_ref()).await?);
        let weighter = create_weighter(&config, store.clone()).await?;

        info!(
            keyword_mode = ?config.keyword_mode,
            coauthorship_source = ?config.coauthorship_source,
            topics = config.topics.enabled,
            include_attributes = config.include_attributes,
            "Graph engine ready"
        );

        Ok(Self::new(config, store, index, snapshot, weighter))
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &Arc<CorpusSnapshot> {
        &self.snapshot
    }

    /// Build the graph for one request
    pub async fn build(&self, request: &BuildRequest) -> Result<RelevanceGraph> {
        let build_id = Uuid::now_v7();
        let span = info_span!("build_graph", %build_id, query = %request.query);

        let start = Instant::now();
        let result = self.run(request).instrument(span.clone()).await;
        let elapsed = start.elapsed().as_secs_f64();

        metrics::record_build(elapsed, result.is_ok());

        let _entered = span.enter();
        match &result {
            Ok(graph) => info!(
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                elapsed_ms = (elapsed * 1000.0) as u64,
                "Graph built"
            ),
            Err(e) => warn!(error = %e, "Graph build failed"),
        }

        result
    }

    async fn run(&self, request: &BuildRequest) -> Result<RelevanceGraph> {
        let params = BuildParams::resolve(&self.config, request)?;
        let config = &self.config;

        let publications = build_publication_layer(
            self.index.as_ref(),
            &self.snapshot,
            self.weighter.as_ref(),
            PublicationQuery {
                query: &request.query,
                fields: &config.search_fields,
                n_starting_nodes: params.n_starting_nodes,
                n_hops: params.n_hops,
                exclude: &params.exclude,
            },
        )
        .await?;
        let papers = &publications.nodes;

        let authors =
            build_author_layer(self.store.as_ref(), papers, config.coauthorship_source).await?;

        let keywords = build_keyword_layer(
            self.store.as_ref(),
            papers,
            KeywordParams {
                mode: config.keyword_mode,
                min_tfidf: config.min_ngram_tfidf,
                statistic: config.keyword_statistic,
                min_score: params.min_ngram_lift,
            },
        )
        .await?;

        let venues = build_venue_layer(&self.snapshot, papers);

        let topics = if config.topics.enabled {
            Some(
                build_topic_layer(
                    self.store.as_ref(),
                    papers,
                    TopicParams {
                        selection: config.topics.selection,
                        statistic: config.topics.statistic,
                        min_score: params.min_topic_score,
                    },
                )
                .await?,
            )
        } else {
            None
        };

        let attributes = if config.include_attributes {
            let topic_nodes = topics.as_ref().map(|t| t.nodes.as_slice()).unwrap_or(&[]);
            Some(
                LayerAttributes::fetch(
                    self.store.as_ref(),
                    papers,
                    &authors.nodes,
                    &keywords.nodes,
                    &venues.nodes,
                    topic_nodes,
                )
                .await?,
            )
        } else {
            None
        };

        let layers = GraphLayers {
            publications,
            authors,
            keywords,
            venues,
            topics,
        };

        assemble(&layers, &self.snapshot, attributes.as_ref())
    }
}
