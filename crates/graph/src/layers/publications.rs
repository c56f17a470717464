use super::report_layer;
use crate::collab::SearchIndex;
use crate::model::{PubId, WeightedEdge};
use crate::normalize::normalize_edges;
use crate::snapshot::CorpusSnapshot;
use crate::weighting::CitationWeighter;
use litgraph_common::errors::Result;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Search parameters of one build
#[derive(Debug, Clone, Copy)]
pub struct PublicationQuery<'a> {
    pub query: &'a str,
    pub fields: &'a [String],
    pub n_starting_nodes: usize,
    pub n_hops: usize,
    pub exclude: &'a HashSet<PubId>,
}

#[derive(Debug, Clone, Default)]
pub struct PublicationLayer {
    /// Sorted publication ids
    pub nodes: Vec<PubId>,

    /// Induced citations, `citing -> cited`, normalized
    pub citations: Vec<WeightedEdge<PubId>>,

    /// Query relevance per publication; absent ids scored nothing
    pub query_scores: HashMap<PubId, f64>,
}

impl PublicationLayer {
    pub fn query_score(&self, paper_id: &str) -> f64 {
        self.query_scores.get(paper_id).copied().unwrap_or(0.0)
    }
}

/// Seed search, citation hops, query scores and weighted induced citations
pub async fn build_publication_layer(
    index: &dyn SearchIndex,
    snapshot: &CorpusSnapshot,
    weighter: &dyn CitationWeighter,
    params: PublicationQuery<'_>,
) -> Result<PublicationLayer> {
    let seeds: HashSet<PubId> = index
        .search(params.query, params.fields, params.exclude, params.n_starting_nodes)
        .await?
        .into_iter()
        .filter(|id| !params.exclude.contains(id))
        .collect();

    debug!(seeds = seeds.len(), "Seed publications found");

    let adjacency = snapshot.adjacency();
    let nodes = adjacency.expand(seeds, params.n_hops, params.exclude);

    let query_scores = index.query_scores(params.query, params.fields, &nodes).await?;
    let unscored = nodes.iter().filter(|id| !query_scores.contains_key(*id)).count();
    if unscored > 0 {
        debug!(unscored, "Publications without a query score default to 0.0");
    }

    let mut pairs: Vec<(PubId, PubId)> = adjacency.subgraph(&nodes).into_iter().collect();
    pairs.sort_unstable();

    let citations = normalize_edges(weighter.weigh(params.query, pairs).await?);

    let mut nodes: Vec<PubId> = nodes.into_iter().collect();
    nodes.sort_unstable();

    report_layer("publications", nodes.len(), citations.len(), citations.len());

    Ok(PublicationLayer {
        nodes,
        citations,
        query_scores,
    })
}
