//! Row records, one per query shape
//!
//! Identifiers are decoded into their canonical form here: publication ids
//! as text, author and venue ids as `i64`, topic ids as `i32`.

use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

/// One `citing -> cited` pair of the citation relation
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct CitationRow {
    pub citing: String,
    pub cited: String,
}

/// Year and venue of a publication, loaded once per engine
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct PublicationFactsRow {
    pub id: String,
    pub year: Option<i32>,
    pub venue_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct AuthorshipRow {
    pub paper_id: String,
    pub author_id: i64,
}

/// Pre-aggregated co-authorship count
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct CoauthorshipRow {
    pub author1: i64,
    pub author2: i64,
    pub npapers: i64,
}

/// Co-author of a given author on one shared paper
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct SharedPaperRow {
    pub coauthor_id: i64,
}

/// Keyword or n-gram attached to a paper
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct DocItemRow {
    pub paper_id: String,
    pub item: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct DocTopicRow {
    pub paper_id: String,
    pub topic_id: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct CitationContextRow {
    pub citing: String,
    pub cited: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct PaperAttributesRow {
    pub id: String,
    pub title: Option<String>,
    pub venue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct AuthorAttributesRow {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub affil: Option<String>,
    pub npapers: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct VenueAttributesRow {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct TopicLabelRow {
    pub topic_id: i32,
    pub words: Option<String>,
}

/// Full-text relevance of a paper for a query
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct ScoredPaperRow {
    pub id: String,
    pub score: f64,
}
