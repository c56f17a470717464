//! Display attributes attached to graph nodes
//!
//! Missing rows and missing columns become empty strings so every node of a
//! kind carries the same keys.

use crate::collab::CorpusStore;
use crate::model::{AuthorId, Keyword, PubId, TopicId, VenueId};
use litgraph_common::errors::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Int(v) => write!(f, "{}", v),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

pub type Attributes = BTreeMap<String, AttributeValue>;

fn attributes<const N: usize>(pairs: [(&str, AttributeValue); N]) -> Attributes {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Attributes per entity, one map per layer
#[derive(Debug, Clone, Default)]
pub struct LayerAttributes {
    pub publications: HashMap<PubId, Attributes>,
    pub authors: HashMap<AuthorId, Attributes>,
    pub keywords: HashMap<Keyword, Attributes>,
    pub venues: HashMap<VenueId, Attributes>,
    pub topics: HashMap<TopicId, Attributes>,
}

impl LayerAttributes {
    /// Fetch attributes for the given node sets
    pub async fn fetch(
        store: &dyn CorpusStore,
        papers: &[PubId],
        authors: &[AuthorId],
        keywords: &[Keyword],
        venues: &[VenueId],
        topics: &[TopicId],
    ) -> Result<Self> {
        Ok(Self {
            publications: publication_attributes(store, papers).await?,
            authors: author_attributes(store, authors).await?,
            keywords: keyword_attributes(keywords),
            venues: venue_attributes(store, venues).await?,
            topics: topic_attributes(store, topics).await?,
        })
    }
}

async fn publication_attributes(
    store: &dyn CorpusStore,
    papers: &[PubId],
) -> Result<HashMap<PubId, Attributes>> {
    let mut rows: HashMap<PubId, (String, String)> = store
        .paper_attributes(papers)
        .await?
        .into_iter()
        .map(|row| (row.id, (row.title.unwrap_or_default(), row.venue.unwrap_or_default())))
        .collect();

    let missing = papers.iter().filter(|id| !rows.contains_key(*id)).count();
    if missing > 0 {
        debug!(missing, "Publications without attribute rows");
    }

    Ok(papers
        .iter()
        .map(|id| {
            let (title, venue) = rows.remove(id).unwrap_or_default();
            let atts = attributes([
                ("label", title.clone().into()),
                ("title", title.into()),
                ("venue", venue.into()),
            ]);
            (id.clone(), atts)
        })
        .collect())
}

async fn author_attributes(
    store: &dyn CorpusStore,
    authors: &[AuthorId],
) -> Result<HashMap<AuthorId, Attributes>> {
    let mut rows: HashMap<AuthorId, _> = store
        .author_attributes(authors)
        .await?
        .into_iter()
        .map(|row| (row.id, row))
        .collect();

    Ok(authors
        .iter()
        .map(|&id| {
            let (name, email, affil, npapers) = match rows.remove(&id) {
                Some(row) => (
                    row.name.unwrap_or_default(),
                    row.email.unwrap_or_default(),
                    row.affil.unwrap_or_default(),
                    row.npapers,
                ),
                None => {
                    debug!(author_id = id, "Author without attribute row");
                    Default::default()
                }
            };
            let atts = attributes([
                ("label", name.clone().into()),
                ("name", name.into()),
                ("email", email.into()),
                ("affil", affil.into()),
                ("npapers", npapers.into()),
            ]);
            (id, atts)
        })
        .collect())
}

fn keyword_attributes(keywords: &[Keyword]) -> HashMap<Keyword, Attributes> {
    keywords
        .iter()
        .map(|kw| (kw.clone(), attributes([("label", kw.as_str().into())])))
        .collect()
}

async fn venue_attributes(
    store: &dyn CorpusStore,
    venues: &[VenueId],
) -> Result<HashMap<VenueId, Attributes>> {
    let mut names: HashMap<VenueId, String> = store
        .venue_attributes(venues)
        .await?
        .into_iter()
        .map(|row| (row.id, row.name.unwrap_or_default()))
        .collect();

    Ok(venues
        .iter()
        .map(|&id| {
            let name = names.remove(&id).unwrap_or_default();
            (id, attributes([("label", name.into())]))
        })
        .collect())
}

async fn topic_attributes(
    store: &dyn CorpusStore,
    topics: &[TopicId],
) -> Result<HashMap<TopicId, Attributes>> {
    if topics.is_empty() {
        return Ok(HashMap::new());
    }

    let mut words: HashMap<TopicId, String> = store
        .topic_labels()
        .await?
        .into_iter()
        .map(|row| (row.topic_id, row.words.unwrap_or_default()))
        .collect();

    Ok(topics
        .iter()
        .map(|&id| {
            let words = words.remove(&id).unwrap_or_default();
            let atts = attributes([
                ("label", words.clone().into()),
                ("description", words.into()),
            ]);
            (id, atts)
        })
        .collect())
}
