//! Read-only corpus state shared by every build

use crate::adjacency::AdjacencyIndex;
use crate::collab::CorpusStore;
use crate::model::{PubId, VenueId};
use litgraph_common::errors::Result;
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

/// Citation adjacency plus publication years and venues, loaded once per
/// engine and never mutated afterwards
#[derive(Debug, Clone, Default)]
pub struct CorpusSnapshot {
    adjacency: AdjacencyIndex,
    years: HashMap<PubId, i32>,
    venues: HashMap<PubId, VenueId>,
}

impl CorpusSnapshot {
    pub fn new(
        adjacency: AdjacencyIndex,
        years: HashMap<PubId, i32>,
        venues: HashMap<PubId, VenueId>,
    ) -> Self {
        Self {
            adjacency,
            years,
            venues,
        }
    }

    /// Read the citation relation and publication facts from the store
    pub async fn load(store: &dyn CorpusStore) -> Result<Self> {
        let start = Instant::now();

        let edges = store.citation_edges().await?;
        let adjacency = AdjacencyIndex::from_edges(edges.into_iter().map(|row| (row.citing, row.cited)));

        let mut years = HashMap::new();
        let mut venues = HashMap::new();
        for row in store.publication_facts().await? {
            if let Some(year) = row.year {
                years.insert(row.id.clone(), year);
            }
            if let Some(venue) = row.venue_id {
                venues.insert(row.id, venue);
            }
        }

        info!(
            citations = adjacency.edge_count(),
            papers = adjacency.node_count(),
            years = years.len(),
            venues = venues.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Corpus snapshot loaded"
        );

        Ok(Self::new(adjacency, years, venues))
    }

    pub fn adjacency(&self) -> &AdjacencyIndex {
        &self.adjacency
    }

    /// Publication year, `0` when unknown
    pub fn year(&self, paper_id: &str) -> i32 {
        self.years.get(paper_id).copied().unwrap_or(0)
    }

    pub fn venue(&self, paper_id: &str) -> Option<VenueId> {
        self.venues.get(paper_id).copied()
    }
}
