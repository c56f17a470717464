//! LitGraph engine
//!
//! Builds a multi-layer relevance graph for a free-text query: seed
//! publications from a search index, citation hops over an in-memory
//! adjacency index, then author, keyword, venue and topic layers keyed by
//! the publication set, all merged into one directed graph.
//!
//! ```text
//! query -> seeds -> hops -> layers -> normalize -> assemble -> export
//! ```

pub mod adjacency;
pub mod assembler;
pub mod association;
pub mod attributes;
pub mod collab;
pub mod engine;
pub mod export;
pub mod layers;
pub mod model;
pub mod normalize;
pub mod snapshot;
pub mod weighting;

pub use adjacency::AdjacencyIndex;
pub use assembler::{GraphEdge, GraphNode, RelevanceGraph};
pub use collab::{CorpusStore, MemoryCorpus, PgCorpus, SearchIndex};
pub use engine::{BuildRequest, GraphEngine};
pub use export::{render, to_gexf, to_node_link, write_graph, ExportFormat, NodeLinkGraph};
pub use model::{NodeKind, WeightedEdge};
pub use snapshot::CorpusSnapshot;
