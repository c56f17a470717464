//! Identifiers, weighted edges and rules shared by every layer

use serde::{Deserialize, Serialize};
use std::fmt;

/// Publication id, canonicalized to its string form
pub type PubId = String;

/// Author cluster id
pub type AuthorId = i64;

/// Keyword or n-gram text
pub type Keyword = String;

pub type VenueId = i64;

pub type TopicId = i32;

/// Directed edge with a non-negative weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEdge<S, T = S> {
    pub source: S,
    pub target: T,
    pub weight: f64,
}

impl<S, T> WeightedEdge<S, T> {
    pub fn new(source: S, target: T, weight: f64) -> Self {
        Self {
            source,
            target,
            weight,
        }
    }
}

/// Co-occurrence rule between two items.
///
/// Lift rules are unordered; interest rules read `antecedent -> consequent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule<I> {
    pub antecedent: I,
    pub consequent: I,
    pub score: f64,
}

impl<I> From<Rule<I>> for WeightedEdge<I> {
    fn from(rule: Rule<I>) -> Self {
        WeightedEdge::new(rule.antecedent, rule.consequent, rule.score)
    }
}

/// Entity type of a unified graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Publication,
    Author,
    Keyword,
    Venue,
    Topic,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Publication => "publication",
            NodeKind::Author => "author",
            NodeKind::Keyword => "keyword",
            NodeKind::Venue => "venue",
            NodeKind::Topic => "topic",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order an unordered pair so `(a, b)` and `(b, a)` share one key
pub fn sorted_pair<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
