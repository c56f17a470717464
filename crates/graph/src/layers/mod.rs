//! Layer builders
//!
//! Every layer is keyed by the publication set of the publication layer and
//! normalized on its own. Builders log a density diagnostic
//! (`pairwise edges / nodes`) and publish it as a gauge; nothing downstream
//! reads it.

mod authors;
mod cooccurrence;
mod publications;
mod venues;

pub use authors::{build_author_layer, coauthorship_weight, AuthorLayer};
pub use cooccurrence::{
    build_keyword_layer, build_topic_layer, select_topics, CooccurrenceLayer, KeywordLayer,
    KeywordParams, TopicLayer, TopicParams,
};
pub use publications::{build_publication_layer, PublicationLayer, PublicationQuery};
pub use venues::{build_venue_layer, VenueLayer};

use crate::normalize::density;
use litgraph_common::metrics;
use tracing::info;

/// Log and publish the size of a finished layer
pub(crate) fn report_layer(layer: &'static str, nodes: usize, pairwise_edges: usize, edges: usize) {
    let density = density(pairwise_edges, nodes);
    info!(layer, nodes, edges, density, "Layer built");
    metrics::record_layer(layer, nodes, edges, density);
}
