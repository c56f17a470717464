//! In-memory corpus for tests and small fixtures
//!
//! Implements both collaborator traits over plain collections. Search scores
//! are `sum(tf * ln(1 + N / df))` over the query tokens found in the
//! requested fields.

use super::{CorpusStore, SearchIndex};
use crate::model::{sorted_pair, AuthorId, PubId, TopicId, VenueId};
use crate::weighting::tfidf::tokenize;
use async_trait::async_trait;
use litgraph_common::config::KeywordMode;
use litgraph_common::db::rows::*;
use litgraph_common::db::SEARCHABLE_FIELDS;
use litgraph_common::errors::{AppError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Default)]
struct PaperRecord {
    title: Option<String>,
    abstract_text: Option<String>,
    year: Option<i32>,
    venue_id: Option<VenueId>,
}

impl PaperRecord {
    fn field(&self, name: &str) -> &str {
        match name {
            "title" => self.title.as_deref().unwrap_or(""),
            "abstract" => self.abstract_text.as_deref().unwrap_or(""),
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct AuthorRecord {
    name: Option<String>,
    email: Option<String>,
    affil: Option<String>,
}

#[derive(Debug, Clone)]
struct CitationRecord {
    citing: PubId,
    cited: PubId,
    context: Option<String>,
}

#[derive(Debug, Clone)]
struct KeywordRecord {
    row: DocItemRow,
    extracted: bool,
}

/// Corpus held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    papers: BTreeMap<PubId, PaperRecord>,
    citations: Vec<CitationRecord>,
    authors: BTreeMap<AuthorId, AuthorRecord>,
    authorships: Vec<(PubId, AuthorId)>,
    ngrams: Vec<DocItemRow>,
    keywords: Vec<KeywordRecord>,
    topics: Vec<DocTopicRow>,
    topic_labels: BTreeMap<TopicId, String>,
    venues: BTreeMap<VenueId, String>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_paper(&mut self, id: &str, title: &str, abstract_text: &str) -> &mut Self {
        let paper = self.papers.entry(id.to_string()).or_default();
        paper.title = Some(title.to_string());
        paper.abstract_text = Some(abstract_text.to_string());
        self
    }

    pub fn set_year(&mut self, id: &str, year: i32) -> &mut Self {
        self.papers.entry(id.to_string()).or_default().year = Some(year);
        self
    }

    pub fn set_venue(&mut self, id: &str, venue: VenueId) -> &mut Self {
        self.papers.entry(id.to_string()).or_default().venue_id = Some(venue);
        self
    }

    pub fn add_venue(&mut self, id: VenueId, name: &str) -> &mut Self {
        self.venues.insert(id, name.to_string());
        self
    }

    pub fn add_citation(&mut self, citing: &str, cited: &str) -> &mut Self {
        self.citations.push(CitationRecord {
            citing: citing.to_string(),
            cited: cited.to_string(),
            context: None,
        });
        self
    }

    pub fn add_citation_with_context(&mut self, citing: &str, cited: &str, context: &str) -> &mut Self {
        self.citations.push(CitationRecord {
            citing: citing.to_string(),
            cited: cited.to_string(),
            context: Some(context.to_string()),
        });
        self
    }

    pub fn add_author(&mut self, id: AuthorId, name: &str, email: &str, affil: &str) -> &mut Self {
        self.authors.insert(
            id,
            AuthorRecord {
                name: Some(name.to_string()),
                email: Some(email.to_string()),
                affil: Some(affil.to_string()),
            },
        );
        self
    }

    pub fn add_authorship(&mut self, paper: &str, author: AuthorId) -> &mut Self {
        self.authorships.push((paper.to_string(), author));
        self
    }

    pub fn add_ngram(&mut self, paper: &str, ngram: &str, value: f64) -> &mut Self {
        self.ngrams.push(DocItemRow {
            paper_id: paper.to_string(),
            item: ngram.to_string(),
            value: Some(value),
        });
        self
    }

    pub fn add_keyword(
        &mut self,
        paper: &str,
        keyword: &str,
        value: Option<f64>,
        extracted: bool,
    ) -> &mut Self {
        self.keywords.push(KeywordRecord {
            row: DocItemRow {
                paper_id: paper.to_string(),
                item: keyword.to_string(),
                value,
            },
            extracted,
        });
        self
    }

    pub fn add_topic(&mut self, paper: &str, topic: TopicId, value: f64) -> &mut Self {
        self.topics.push(DocTopicRow {
            paper_id: paper.to_string(),
            topic_id: topic,
            value,
        });
        self
    }

    pub fn add_topic_label(&mut self, topic: TopicId, words: &str) -> &mut Self {
        self.topic_labels.insert(topic, words.to_string());
        self
    }

    /// Distinct papers of each author
    fn papers_by_author(&self) -> HashMap<AuthorId, BTreeSet<&str>> {
        let mut papers: HashMap<AuthorId, BTreeSet<&str>> = HashMap::new();
        for (paper, author) in &self.authorships {
            papers.entry(*author).or_default().insert(paper.as_str());
        }
        papers
    }

    /// Distinct authors of each paper
    fn authors_by_paper(&self) -> HashMap<&str, BTreeSet<AuthorId>> {
        let mut authors: HashMap<&str, BTreeSet<AuthorId>> = HashMap::new();
        for (paper, author) in &self.authorships {
            authors.entry(paper.as_str()).or_default().insert(*author);
        }
        authors
    }

    fn check_fields(fields: &[String]) -> Result<()> {
        if fields.is_empty() {
            return Err(AppError::Validation {
                message: "At least one search field is required".to_string(),
                field: Some("search_fields".to_string()),
            });
        }
        match fields.iter().find(|f| !SEARCHABLE_FIELDS.contains(&f.as_str())) {
            Some(field) => Err(AppError::Validation {
                message: format!("Field '{}' is not searchable", field),
                field: Some("search_fields".to_string()),
            }),
            None => Ok(()),
        }
    }

    /// Relevance of every paper matching at least one query token
    fn score_all(&self, query: &str, fields: &[String]) -> HashMap<&str, f64> {
        let terms: BTreeSet<String> = tokenize(query).into_iter().collect();
        if terms.is_empty() {
            return HashMap::new();
        }

        let documents: Vec<(&str, Vec<String>)> = self
            .papers
            .iter()
            .map(|(id, paper)| {
                let tokens = fields.iter().flat_map(|f| tokenize(paper.field(f))).collect();
                (id.as_str(), tokens)
            })
            .collect();

        let n = documents.len() as f64;
        let df: HashMap<&String, f64> = terms
            .iter()
            .map(|term| {
                let count = documents.iter().filter(|(_, tokens)| tokens.contains(term)).count();
                (term, count as f64)
            })
            .collect();

        documents
            .iter()
            .filter_map(|(id, tokens)| {
                let score: f64 = terms
                    .iter()
                    .map(|term| {
                        let tf = tokens.iter().filter(|t| *t == term).count() as f64;
                        match df.get(term) {
                            Some(&df) if df > 0.0 => tf * (1.0 + n / df).ln(),
                            _ => 0.0,
                        }
                    })
                    .sum();
                (score > 0.0).then_some((*id, score))
            })
            .collect()
    }
}

#[async_trait]
impl SearchIndex for MemoryCorpus {
    async fn search(
        &self,
        query: &str,
        fields: &[String],
        exclude: &HashSet<PubId>,
        limit: usize,
    ) -> Result<Vec<PubId>> {
        Self::check_fields(fields)?;

        let mut scored: Vec<(&str, f64)> = self
            .score_all(query, fields)
            .into_iter()
            .filter(|(id, _)| !exclude.contains(*id))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(id, _)| id.to_string())
            .collect())
    }

    async fn query_scores(
        &self,
        query: &str,
        fields: &[String],
        ids: &HashSet<PubId>,
    ) -> Result<HashMap<PubId, f64>> {
        Self::check_fields(fields)?;

        Ok(self
            .score_all(query, fields)
            .into_iter()
            .filter(|(id, _)| ids.contains(*id))
            .map(|(id, score)| (id.to_string(), score))
            .collect())
    }
}

#[async_trait]
impl CorpusStore for MemoryCorpus {
    async fn citation_edges(&self) -> Result<Vec<CitationRow>> {
        Ok(self
            .citations
            .iter()
            .map(|c| CitationRow {
                citing: c.citing.clone(),
                cited: c.cited.clone(),
            })
            .collect())
    }

    async fn publication_facts(&self) -> Result<Vec<PublicationFactsRow>> {
        Ok(self
            .papers
            .iter()
            .map(|(id, paper)| PublicationFactsRow {
                id: id.clone(),
                year: paper.year,
                venue_id: paper.venue_id,
            })
            .collect())
    }

    async fn authors_of(&self, paper: &str) -> Result<Vec<AuthorId>> {
        Ok(self
            .authors_by_paper()
            .remove(paper)
            .map(|authors| authors.into_iter().collect())
            .unwrap_or_default())
    }

    async fn coauthorship_counts(&self, author: AuthorId) -> Result<Vec<CoauthorshipRow>> {
        let mut counts: BTreeMap<(AuthorId, AuthorId), i64> = BTreeMap::new();
        for authors in self.authors_by_paper().values() {
            if !authors.contains(&author) {
                continue;
            }
            for &other in authors.iter().filter(|&&a| a != author) {
                *counts.entry(sorted_pair(author, other)).or_insert(0) += 1;
            }
        }

        Ok(counts
            .into_iter()
            .map(|((author1, author2), npapers)| CoauthorshipRow {
                author1,
                author2,
                npapers,
            })
            .collect())
    }

    async fn shared_paper_coauthors(&self, author: AuthorId) -> Result<Vec<AuthorId>> {
        let by_paper = self.authors_by_paper();
        let mut coauthors = Vec::new();
        if let Some(papers) = self.papers_by_author().get(&author) {
            for paper in papers {
                if let Some(authors) = by_paper.get(paper) {
                    coauthors.extend(authors.iter().copied().filter(|&a| a != author));
                }
            }
        }
        Ok(coauthors)
    }

    async fn doc_ngrams(&self, papers: &[PubId], min_value: f64) -> Result<Vec<DocItemRow>> {
        let papers: HashSet<&str> = papers.iter().map(String::as_str).collect();
        Ok(self
            .ngrams
            .iter()
            .filter(|row| papers.contains(row.paper_id.as_str()))
            .filter(|row| row.value.is_some_and(|v| v >= min_value))
            .cloned()
            .collect())
    }

    async fn doc_keywords(
        &self,
        papers: &[PubId],
        mode: KeywordMode,
        min_value: f64,
    ) -> Result<Vec<DocItemRow>> {
        let above = |row: &DocItemRow| row.value.is_some_and(|v| v >= min_value);
        let keep = |record: &KeywordRecord| -> Result<bool> {
            Ok(match mode {
                KeywordMode::Extracted => record.extracted,
                KeywordMode::Extended => !record.extracted && above(&record.row),
                KeywordMode::Both => above(&record.row),
                KeywordMode::Ngrams => {
                    return Err(AppError::config("n-gram mode reads doc_ngrams, not doc_kws"))
                }
            })
        };

        let papers: HashSet<&str> = papers.iter().map(String::as_str).collect();
        let mut rows = Vec::new();
        for record in &self.keywords {
            if papers.contains(record.row.paper_id.as_str()) && keep(record)? {
                rows.push(record.row.clone());
            }
        }
        Ok(rows)
    }

    async fn doc_topics(&self, paper: &str) -> Result<Vec<DocTopicRow>> {
        Ok(self
            .topics
            .iter()
            .filter(|row| row.paper_id == paper)
            .cloned()
            .collect())
    }

    async fn citation_context(&self, citing: &str, cited: &str) -> Result<Option<String>> {
        Ok(self
            .citations
            .iter()
            .find(|c| c.citing == citing && c.cited == cited)
            .and_then(|c| c.context.clone()))
    }

    async fn paper_attributes(&self, papers: &[PubId]) -> Result<Vec<PaperAttributesRow>> {
        Ok(papers
            .iter()
            .filter_map(|id| {
                let paper = self.papers.get(id)?;
                Some(PaperAttributesRow {
                    id: id.clone(),
                    title: paper.title.clone(),
                    venue: paper.venue_id.and_then(|v| self.venues.get(&v).cloned()),
                })
            })
            .collect())
    }

    async fn author_attributes(&self, authors: &[AuthorId]) -> Result<Vec<AuthorAttributesRow>> {
        let papers = self.papers_by_author();
        Ok(authors
            .iter()
            .filter_map(|id| {
                let author = self.authors.get(id)?;
                Some(AuthorAttributesRow {
                    id: *id,
                    name: author.name.clone(),
                    email: author.email.clone(),
                    affil: author.affil.clone(),
                    npapers: papers.get(id).map(|p| p.len() as i64).unwrap_or(0),
                })
            })
            .collect())
    }

    async fn venue_attributes(&self, venues: &[VenueId]) -> Result<Vec<VenueAttributesRow>> {
        Ok(venues
            .iter()
            .filter_map(|id| {
                self.venues.get(id).map(|name| VenueAttributesRow {
                    id: *id,
                    name: Some(name.clone()),
                })
            })
            .collect())
    }

    async fn topic_labels(&self) -> Result<Vec<TopicLabelRow>> {
        Ok(self
            .topic_labels
            .iter()
            .map(|(&topic_id, words)| TopicLabelRow {
                topic_id,
                words: Some(words.clone()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<String> {
        vec!["title".to_string(), "abstract".to_string()]
    }

    fn corpus() -> MemoryCorpus {
        let mut corpus = MemoryCorpus::new();
        corpus
            .add_paper("p1", "Graph ranking", "Ranking papers on citation graphs")
            .add_paper("p2", "Citation analysis", "Counting citations")
            .add_paper("p3", "Protein folding", "Structure prediction")
            .add_authorship("p1", 1)
            .add_authorship("p1", 2)
            .add_authorship("p2", 1)
            .add_authorship("p2", 2)
            .add_authorship("p2", 3);
        corpus
    }

    #[tokio::test]
    async fn test_search_ranks_and_excludes() {
        let corpus = corpus();
        let hits = corpus.search("ranking", &fields(), &HashSet::new(), 10).await.unwrap();
        assert_eq!(hits, vec!["p1".to_string()]);

        let exclude: HashSet<PubId> = ["p1".to_string()].into_iter().collect();
        let hits = corpus.search("ranking citation", &fields(), &exclude, 10).await.unwrap();
        assert_eq!(hits, vec!["p2".to_string()]);
    }

    #[tokio::test]
    async fn test_search_rejects_unknown_field() {
        let corpus = corpus();
        let result = corpus
            .search("graph", &["body".to_string()], &HashSet::new(), 5)
            .await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_query_scores_only_for_requested_ids() {
        let corpus = corpus();
        let ids: HashSet<PubId> = ["p1".to_string(), "p3".to_string()].into_iter().collect();
        let scores = corpus.query_scores("graph", &fields(), &ids).await.unwrap();
        assert!(scores["p1"] > 0.0);
        assert!(!scores.contains_key("p3"));
    }

    #[tokio::test]
    async fn test_coauthorship_counts() {
        let corpus = corpus();
        let rows = corpus.coauthorship_counts(1).await.unwrap();
        assert_eq!(
            rows,
            vec![
                CoauthorshipRow { author1: 1, author2: 2, npapers: 2 },
                CoauthorshipRow { author1: 1, author2: 3, npapers: 1 },
            ]
        );

        let mut shared = corpus.shared_paper_coauthors(1).await.unwrap();
        shared.sort_unstable();
        assert_eq!(shared, vec![2, 2, 3]);
    }

    #[tokio::test]
    async fn test_keyword_modes() {
        let mut corpus = MemoryCorpus::new();
        corpus
            .add_keyword("p1", "graphs", None, true)
            .add_keyword("p1", "ranking", Some(0.4), false)
            .add_keyword("p1", "noise", Some(0.1), false);
        let papers = vec!["p1".to_string()];

        let extracted = corpus.doc_keywords(&papers, KeywordMode::Extracted, 0.25).await.unwrap();
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].item, "graphs");

        let extended = corpus.doc_keywords(&papers, KeywordMode::Extended, 0.25).await.unwrap();
        assert_eq!(extended.len(), 1);
        assert_eq!(extended[0].item, "ranking");

        assert!(corpus.doc_keywords(&papers, KeywordMode::Ngrams, 0.25).await.is_err());
    }
}
