//! Weighting from citation contexts kept in the corpus store
//!
//! The vectorizer is fitted per build over the contexts of the induced
//! citations only.

use super::tfidf::{cosine_similarity, strip_citation_placeholder, TfidfVectorizer};
use super::CitationWeighter;
use crate::collab::CorpusStore;
use crate::model::{PubId, WeightedEdge};
use async_trait::async_trait;
use litgraph_common::errors::Result;
use std::sync::Arc;
use tracing::debug;

pub struct StoreContextWeighter {
    store: Arc<dyn CorpusStore>,
    vectorizer: TfidfVectorizer,
}

impl StoreContextWeighter {
    pub fn new(store: Arc<dyn CorpusStore>) -> Self {
        Self {
            store,
            vectorizer: TfidfVectorizer::default(),
        }
    }
}

#[async_trait]
impl CitationWeighter for StoreContextWeighter {
    async fn weigh(
        &self,
        query: &str,
        edges: Vec<(PubId, PubId)>,
    ) -> Result<Vec<WeightedEdge<PubId>>> {
        let mut contexts = Vec::with_capacity(edges.len());
        for (citing, cited) in &edges {
            let context = self
                .store
                .citation_context(citing, cited)
                .await?
                .map(|text| strip_citation_placeholder(&text))
                .unwrap_or_default();
            contexts.push(context);
        }

        let fitted = self.vectorizer.fit(&contexts);
        let query_vector = fitted.transform(query);

        debug!(
            edges = edges.len(),
            vocabulary = fitted.vocabulary_len(),
            "Fitted citation context vectorizer"
        );

        Ok(edges
            .into_iter()
            .zip(&contexts)
            .map(|((citing, cited), context)| {
                let weight = cosine_similarity(&query_vector, &fitted.transform(context));
                WeightedEdge::new(citing, cited, weight)
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "store_contexts"
    }
}
