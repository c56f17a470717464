//! Citation edge weighting
//!
//! A weighter turns the induced citation pairs into weighted edges. The
//! context-based strategies score each citation by how similar the text
//! around it is to the query.

mod sidecar;
mod store;
pub mod tfidf;

pub use sidecar::SidecarContextWeighter;
pub use store::StoreContextWeighter;

use crate::collab::CorpusStore;
use crate::model::{PubId, WeightedEdge};
use async_trait::async_trait;
use litgraph_common::config::{CitationWeighting, GraphConfig};
use litgraph_common::errors::Result;
use std::sync::Arc;
use tracing::info;

/// Strategy assigning a weight to every citation edge
#[async_trait]
pub trait CitationWeighter: Send + Sync {
    /// Weigh `(citing, cited)` pairs, keeping their order
    async fn weigh(
        &self,
        query: &str,
        edges: Vec<(PubId, PubId)>,
    ) -> Result<Vec<WeightedEdge<PubId>>>;

    fn name(&self) -> &'static str;
}

/// Constant weight of 1.0
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformWeighter;

#[async_trait]
impl CitationWeighter for UniformWeighter {
    async fn weigh(
        &self,
        _query: &str,
        edges: Vec<(PubId, PubId)>,
    ) -> Result<Vec<WeightedEdge<PubId>>> {
        Ok(edges
            .into_iter()
            .map(|(citing, cited)| WeightedEdge::new(citing, cited, 1.0))
            .collect())
    }

    fn name(&self) -> &'static str {
        "uniform"
    }
}

/// Build the configured weighter
pub async fn create_weighter(
    config: &GraphConfig,
    store: Arc<dyn CorpusStore>,
) -> Result<Arc<dyn CitationWeighter>> {
    let weighter: Arc<dyn CitationWeighter> = match config.citation_weighting {
        CitationWeighting::Uniform => Arc::new(UniformWeighter),
        CitationWeighting::SidecarContexts => {
            Arc::new(SidecarContextWeighter::load(&config.contexts).await?)
        }
        CitationWeighting::StoreContexts => Arc::new(StoreContextWeighter::new(store)),
    };

    info!(strategy = weighter.name(), "Citation weighting ready");
    Ok(weighter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::MemoryCorpus;

    #[tokio::test]
    async fn test_uniform_weights() {
        let edges = vec![
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "c".to_string()),
        ];
        let weighted = UniformWeighter.weigh("query", edges).await.unwrap();
        assert_eq!(weighted.len(), 2);
        assert!(weighted.iter().all(|e| e.weight == 1.0));
        assert_eq!(weighted[1].source, "b");
    }

    #[tokio::test]
    async fn test_create_default_weighter() {
        let store: Arc<dyn CorpusStore> = Arc::new(MemoryCorpus::new());
        let weighter = create_weighter(&GraphConfig::default(), store).await.unwrap();
        assert_eq!(weighter.name(), "uniform");
    }

    #[tokio::test]
    async fn test_create_store_weighter() {
        let store: Arc<dyn CorpusStore> = Arc::new(MemoryCorpus::new());
        let config = GraphConfig {
            citation_weighting: CitationWeighting::StoreContexts,
            ..GraphConfig::default()
        };
        let weighter = create_weighter(&config, store).await.unwrap();
        assert_eq!(weighter.name(), "store_contexts");
    }
}
