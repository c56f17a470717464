//! Collaborators the engine reads from
//!
//! - `SearchIndex`: ranked query matching over publications
//! - `CorpusStore`: typed relational lookups keyed by entity ids
//!
//! Both are assumed to return complete, consistent snapshots; failures are
//! propagated and abort the build.

mod memory;
mod postgres;

pub use memory::MemoryCorpus;
pub use postgres::PgCorpus;

use crate::model::{AuthorId, PubId, VenueId};
use async_trait::async_trait;
use litgraph_common::config::KeywordMode;
use litgraph_common::db::rows::*;
use litgraph_common::errors::Result;
use std::collections::{HashMap, HashSet};

/// Ranked search over publication text
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Top `limit` publications for the query, never returning `exclude`
    async fn search(
        &self,
        query: &str,
        fields: &[String],
        exclude: &HashSet<PubId>,
        limit: usize,
    ) -> Result<Vec<PubId>>;

    /// Relevance of each given publication; unmatched ids may be absent
    async fn query_scores(
        &self,
        query: &str,
        fields: &[String],
        ids: &HashSet<PubId>,
    ) -> Result<HashMap<PubId, f64>>;
}

/// Relational lookups over the corpus
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// The full citation relation
    async fn citation_edges(&self) -> Result<Vec<CitationRow>>;

    /// Year and venue of every publication
    async fn publication_facts(&self) -> Result<Vec<PublicationFactsRow>>;

    async fn authors_of(&self, paper: &str) -> Result<Vec<AuthorId>>;

    /// Pre-aggregated co-authorship counts involving `author`
    async fn coauthorship_counts(&self, author: AuthorId) -> Result<Vec<CoauthorshipRow>>;

    /// Co-authors of `author`, repeated once per shared paper
    async fn shared_paper_coauthors(&self, author: AuthorId) -> Result<Vec<AuthorId>>;

    async fn doc_ngrams(&self, papers: &[PubId], min_value: f64) -> Result<Vec<DocItemRow>>;

    async fn doc_keywords(
        &self,
        papers: &[PubId],
        mode: KeywordMode,
        min_value: f64,
    ) -> Result<Vec<DocItemRow>>;

    async fn doc_topics(&self, paper: &str) -> Result<Vec<DocTopicRow>>;

    /// Text around a citation, if recorded
    async fn citation_context(&self, citing: &str, cited: &str) -> Result<Option<String>>;

    async fn paper_attributes(&self, papers: &[PubId]) -> Result<Vec<PaperAttributesRow>>;

    async fn author_attributes(&self, authors: &[AuthorId]) -> Result<Vec<AuthorAttributesRow>>;

    async fn venue_attributes(&self, venues: &[VenueId]) -> Result<Vec<VenueAttributesRow>>;

    async fn topic_labels(&self) -> Result<Vec<TopicLabelRow>>;
}
