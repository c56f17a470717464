//! Bidirectional adjacency over the citation relation
//!
//! Both directions are indexed so that frontier expansion and induced-edge
//! extraction only touch the neighbour lists of the nodes involved, never the
//! whole relation.

use crate::model::PubId;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// In-memory citation adjacency
#[derive(Debug, Clone, Default)]
pub struct AdjacencyIndex {
    /// paper -> papers it cites
    outgoing: HashMap<PubId, Vec<PubId>>,

    /// paper -> papers citing it
    incoming: HashMap<PubId, Vec<PubId>>,

    edge_count: usize,
}

impl AdjacencyIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(citing, cited)` pairs. Ids are stored in string form and
    /// parallel edges are kept.
    pub fn from_edges<I, A, B>(edges: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: ToString,
        B: ToString,
    {
        let mut index = Self::new();
        for (citing, cited) in edges {
            index.add_edge(citing.to_string(), cited.to_string());
        }
        index
    }

    /// Add a single edge
    pub fn add_edge(&mut self, citing: PubId, cited: PubId) {
        self.outgoing.entry(citing.clone()).or_default().push(cited.clone());
        self.incoming.entry(cited).or_default().push(citing);
        self.edge_count += 1;
    }

    /// Papers cited by this paper
    pub fn references(&self, paper_id: &str) -> &[PubId] {
        self.outgoing.get(paper_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Papers citing this paper
    pub fn citations(&self, paper_id: &str) -> &[PubId] {
        self.incoming.get(paper_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Edges in the relation, parallel edges included
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Distinct papers appearing on either side of an edge
    pub fn node_count(&self) -> usize {
        self.outgoing
            .keys()
            .chain(self.incoming.keys())
            .collect::<HashSet<_>>()
            .len()
    }

    /// All nodes one edge away from `nodes`, in either direction
    pub fn follow(&self, nodes: &HashSet<PubId>) -> HashSet<PubId> {
        let mut neighbours = HashSet::new();
        for node in nodes {
            neighbours.extend(self.references(node).iter().cloned());
            neighbours.extend(self.citations(node).iter().cloned());
        }
        neighbours
    }

    /// Every edge of the relation with both endpoints in `nodes`, without
    /// self-loops or duplicates
    pub fn subgraph(&self, nodes: &HashSet<PubId>) -> HashSet<(PubId, PubId)> {
        let mut edges = HashSet::new();
        for citing in nodes {
            for cited in self.references(citing) {
                if citing != cited && nodes.contains(cited) {
                    edges.insert((citing.clone(), cited.clone()));
                }
            }
        }
        edges
    }

    /// Grow `seeds` by `hops` citation hops, never entering `exclude`.
    ///
    /// Only the nodes discovered in the previous hop are expanded again.
    pub fn expand(
        &self,
        seeds: HashSet<PubId>,
        hops: usize,
        exclude: &HashSet<PubId>,
    ) -> HashSet<PubId> {
        let mut visited = seeds.clone();
        let mut frontier = seeds;

        for hop in 0..hops {
            if frontier.is_empty() {
                break;
            }

            let next: HashSet<PubId> = self
                .follow(&frontier)
                .into_iter()
                .filter(|id| !exclude.contains(id) && !visited.contains(id))
                .collect();

            visited.extend(next.iter().cloned());
            frontier = next;

            debug!(hop = hop + 1, nodes = visited.len(), frontier = frontier.len(), "Citation hop");
        }

        visited
    }
}
