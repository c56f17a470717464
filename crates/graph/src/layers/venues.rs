use super::report_layer;
use crate::model::{PubId, VenueId, WeightedEdge};
use crate::snapshot::CorpusSnapshot;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct VenueLayer {
    /// Sorted venue ids
    pub nodes: Vec<VenueId>,

    /// Publication -> venue, weight 1.0
    pub placements: Vec<WeightedEdge<PubId, VenueId>>,
}

/// Venues of the given publications, from the snapshot
pub fn build_venue_layer(snapshot: &CorpusSnapshot, papers: &[PubId]) -> VenueLayer {
    let mut venues = BTreeSet::new();
    let mut placements = Vec::new();

    for paper in papers {
        match snapshot.venue(paper) {
            Some(venue) => {
                venues.insert(venue);
                placements.push(WeightedEdge::new(paper.clone(), venue, 1.0));
            }
            None => debug!(paper_id = %paper, "Publication has no venue"),
        }
    }

    let nodes: Vec<VenueId> = venues.into_iter().collect();
    report_layer("venues", nodes.len(), 0, placements.len());

    VenueLayer { nodes, placements }
}
