//! PostgreSQL-backed collaborators
//!
//! Search uses PostgreSQL full-text ranking over the `papers` table; every
//! other lookup goes through the shared repository.

use super::{CorpusStore, SearchIndex};
use crate::model::{AuthorId, PubId, VenueId};
use async_trait::async_trait;
use litgraph_common::config::KeywordMode;
use litgraph_common::db::rows::*;
use litgraph_common::db::Repository;
use litgraph_common::errors::Result;
use std::collections::{HashMap, HashSet};

/// Corpus store and search index over one database
#[derive(Clone)]
pub struct PgCorpus {
    repo: Repository,
}

impl PgCorpus {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl SearchIndex for PgCorpus {
    async fn search(
        &self,
        query: &str,
        fields: &[String],
        exclude: &HashSet<PubId>,
        limit: usize,
    ) -> Result<Vec<PubId>> {
        let exclude: Vec<String> = exclude.iter().cloned().collect();
        let rows = self.repo.search_papers(query, fields, &exclude, limit).await?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    async fn query_scores(
        &self,
        query: &str,
        fields: &[String],
        ids: &HashSet<PubId>,
    ) -> Result<HashMap<PubId, f64>> {
        let ids: Vec<String> = ids.iter().cloned().collect();
        let rows = self.repo.score_papers(query, fields, &ids).await?;
        Ok(rows.into_iter().map(|row| (row.id, row.score)).collect())
    }
}

#[async_trait]
impl CorpusStore for PgCorpus {
    async fn citation_edges(&self) -> Result<Vec<CitationRow>> {
        self.repo.citation_edges().await
    }

    async fn publication_facts(&self) -> Result<Vec<PublicationFactsRow>> {
        self.repo.publication_facts().await
    }

    async fn authors_of(&self, paper: &str) -> Result<Vec<AuthorId>> {
        let rows = self.repo.authors_of_paper(paper).await?;
        Ok(rows.into_iter().map(|row| row.author_id).collect())
    }

    async fn coauthorship_counts(&self, author: AuthorId) -> Result<Vec<CoauthorshipRow>> {
        self.repo.coauthorships_of(author).await
    }

    async fn shared_paper_coauthors(&self, author: AuthorId) -> Result<Vec<AuthorId>> {
        let rows = self.repo.shared_paper_coauthors(author).await?;
        Ok(rows.into_iter().map(|row| row.coauthor_id).collect())
    }

    async fn doc_ngrams(&self, papers: &[PubId], min_value: f64) -> Result<Vec<DocItemRow>> {
        self.repo.doc_ngrams(papers, min_value).await
    }

    async fn doc_keywords(
        &self,
        papers: &[PubId],
        mode: KeywordMode,
        min_value: f64,
    ) -> Result<Vec<DocItemRow>> {
        self.repo.doc_keywords(papers, mode, min_value).await
    }

    async fn doc_topics(&self, paper: &str) -> Result<Vec<DocTopicRow>> {
        self.repo.doc_topics(paper).await
    }

    async fn citation_context(&self, citing: &str, cited: &str) -> Result<Option<String>> {
        let row = self.repo.citation_context(citing, cited).await?;
        Ok(row.and_then(|row| row.context))
    }

    async fn paper_attributes(&self, papers: &[PubId]) -> Result<Vec<PaperAttributesRow>> {
        self.repo.paper_attributes(papers).await
    }

    async fn author_attributes(&self, authors: &[AuthorId]) -> Result<Vec<AuthorAttributesRow>> {
        self.repo.author_attributes(authors).await
    }

    async fn venue_attributes(&self, venues: &[VenueId]) -> Result<Vec<VenueAttributesRow>> {
        self.repo.venue_attributes(venues).await
    }

    async fn topic_labels(&self) -> Result<Vec<TopicLabelRow>> {
        self.repo.topic_labels().await
    }
}
