//! Keyword and topic layers
//!
//! Both share one shape: items attached to publications with a per-document
//! value, plus item-item edges mined from the per-document item sets.

use super::report_layer;
use crate::association::mine_rules;
use crate::collab::CorpusStore;
use crate::model::{Keyword, PubId, TopicId, WeightedEdge};
use crate::normalize::normalize_edges;
use litgraph_common::config::{CooccurrenceStatistic, KeywordMode, SelectBy};
use litgraph_common::db::rows::DocTopicRow;
use litgraph_common::errors::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct CooccurrenceLayer<I> {
    /// Sorted item ids
    pub nodes: Vec<I>,

    /// Mined item-item edges, normalized. Unordered for lift, directional
    /// for interest.
    pub cooccurrences: Vec<WeightedEdge<I>>,

    /// Publication -> item, normalized
    pub memberships: Vec<WeightedEdge<PubId, I>>,

    /// Statistic the item-item edges were mined with
    pub statistic: CooccurrenceStatistic,
}

impl<I> CooccurrenceLayer<I> {
    /// Whether item-item edges hold in both directions
    pub fn is_symmetric(&self) -> bool {
        self.statistic == CooccurrenceStatistic::Lift
    }
}

pub type KeywordLayer = CooccurrenceLayer<Keyword>;

pub type TopicLayer = CooccurrenceLayer<TopicId>;

#[derive(Debug, Clone, Copy)]
pub struct KeywordParams {
    pub mode: KeywordMode,
    pub min_tfidf: f64,
    pub statistic: CooccurrenceStatistic,
    pub min_score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct TopicParams {
    pub selection: SelectBy,
    pub statistic: CooccurrenceStatistic,
    pub min_score: f64,
}

/// Per-document item values; the largest value wins for repeated items
type DocumentItems<I> = BTreeMap<PubId, BTreeMap<I, f64>>;

fn assemble_layer<I>(
    layer: &'static str,
    documents: DocumentItems<I>,
    statistic: CooccurrenceStatistic,
    min_score: f64,
) -> CooccurrenceLayer<I>
where
    I: Clone + Eq + Hash + Ord,
{
    let transactions: Vec<Vec<I>> = documents
        .values()
        .map(|items| items.keys().cloned().collect())
        .collect();

    // interest can be negative; such rules are not edges
    let cooccurrences: Vec<WeightedEdge<I>> = mine_rules(&transactions, statistic, min_score.max(0.0))
        .into_iter()
        .map(Into::into)
        .collect();

    let nodes: BTreeSet<I> = documents.values().flat_map(|items| items.keys().cloned()).collect();

    let memberships: Vec<WeightedEdge<PubId, I>> = documents
        .into_iter()
        .flat_map(|(paper, items)| {
            items
                .into_iter()
                .map(move |(item, value)| WeightedEdge::new(paper.clone(), item, value))
        })
        .collect();

    let cooccurrences = normalize_edges(cooccurrences);
    let memberships = normalize_edges(memberships);
    let nodes: Vec<I> = nodes.into_iter().collect();

    report_layer(
        layer,
        nodes.len(),
        cooccurrences.len(),
        cooccurrences.len() + memberships.len(),
    );

    CooccurrenceLayer {
        nodes,
        cooccurrences,
        memberships,
        statistic,
    }
}

/// Keywords or n-grams of the given publications, per the configured mode
pub async fn build_keyword_layer(
    store: &dyn CorpusStore,
    papers: &[PubId],
    params: KeywordParams,
) -> Result<KeywordLayer> {
    let rows = match params.mode {
        KeywordMode::Ngrams => store.doc_ngrams(papers, params.min_tfidf).await?,
        mode => store.doc_keywords(papers, mode, params.min_tfidf).await?,
    };

    let mut documents: DocumentItems<Keyword> = BTreeMap::new();
    for row in rows {
        let value = row.value.unwrap_or(1.0);
        let slot = documents
            .entry(row.paper_id)
            .or_default()
            .entry(row.item)
            .or_insert(value);
        *slot = slot.max(value);
    }

    Ok(assemble_layer(
        "keywords",
        documents,
        params.statistic,
        params.min_score,
    ))
}

/// Topics of one document chosen by `selection`
pub fn select_topics(mut rows: Vec<DocTopicRow>, selection: SelectBy) -> Vec<DocTopicRow> {
    match selection {
        SelectBy::TopN(n) => {
            rows.sort_by(|a, b| {
                b.value
                    .total_cmp(&a.value)
                    .then_with(|| a.topic_id.cmp(&b.topic_id))
            });
            rows.truncate(n);
            rows
        }
        SelectBy::Threshold(floor) => rows.into_iter().filter(|row| row.value > floor).collect(),
    }
}

/// Topics of the given publications and their pairwise correlations
pub async fn build_topic_layer(
    store: &dyn CorpusStore,
    papers: &[PubId],
    params: TopicParams,
) -> Result<TopicLayer> {
    let mut documents: DocumentItems<TopicId> = BTreeMap::new();
    for paper in papers {
        let selected = select_topics(store.doc_topics(paper).await?, params.selection);
        if selected.is_empty() {
            continue;
        }

        let items = documents.entry(paper.clone()).or_default();
        for row in selected {
            let slot = items.entry(row.topic_id).or_insert(row.value);
            *slot = slot.max(row.value);
        }
    }

    Ok(assemble_layer(
        "topics",
        documents,
        params.statistic,
        params.min_score,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::MemoryCorpus;

    fn papers(ids: &[&str]) -> Vec<PubId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn topic(paper: &str, topic_id: TopicId, value: f64) -> DocTopicRow {
        DocTopicRow {
            paper_id: paper.to_string(),
            topic_id,
            value,
        }
    }

    #[tokio::test]
    async fn test_ngram_layer_lift() {
        // the lift fixture, one paper per transaction
        let mut corpus = MemoryCorpus::new();
        corpus
            .add_ngram("p1", "a", 0.5)
            .add_ngram("p1", "b", 1.0)
            .add_ngram("p2", "a", 0.5)
            .add_ngram("p2", "b", 0.5)
            .add_ngram("p3", "a", 0.5)
            .add_ngram("p4", "b", 0.5)
            .add_ngram("p5", "c", 0.5)
            .add_ngram("p5", "dropped", 0.1);

        let layer = build_keyword_layer(
            &corpus,
            &papers(&["p1", "p2", "p3", "p4", "p5"]),
            KeywordParams {
                mode: KeywordMode::Ngrams,
                min_tfidf: 0.25,
                statistic: CooccurrenceStatistic::Lift,
                min_score: 1.0,
            },
        )
        .await
        .unwrap();

        assert_eq!(layer.nodes, vec!["a", "b", "c"]);
        assert_eq!(layer.cooccurrences.len(), 1);
        assert_eq!(layer.cooccurrences[0].source, "a");
        assert_eq!(layer.cooccurrences[0].target, "b");
        assert_eq!(layer.cooccurrences[0].weight, 1.0);
        assert!(layer.is_symmetric());

        assert_eq!(layer.memberships.len(), 7);
        let strongest = layer
            .memberships
            .iter()
            .find(|e| e.source == "p1" && e.target == "b")
            .unwrap();
        assert_eq!(strongest.weight, 1.0);
        assert!(layer.memberships.iter().all(|e| e.weight <= 1.0));
    }

    #[tokio::test]
    async fn test_keyword_without_value_weighs_one() {
        let mut corpus = MemoryCorpus::new();
        corpus
            .add_keyword("p1", "graphs", None, true)
            .add_keyword("p2", "graphs", None, true);

        let layer = build_keyword_layer(
            &corpus,
            &papers(&["p1", "p2"]),
            KeywordParams {
                mode: KeywordMode::Extracted,
                min_tfidf: 0.25,
                statistic: CooccurrenceStatistic::Lift,
                min_score: 1.0,
            },
        )
        .await
        .unwrap();

        assert_eq!(layer.nodes, vec!["graphs"]);
        assert!(layer.cooccurrences.is_empty());
        assert!(layer.memberships.iter().all(|e| e.weight == 1.0));
    }

    #[test]
    fn test_select_top_n() {
        let rows = vec![topic("p", 1, 0.1), topic("p", 2, 0.6), topic("p", 3, 0.3)];
        let selected = select_topics(rows, SelectBy::TopN(2));
        let ids: Vec<TopicId> = selected.iter().map(|r| r.topic_id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_select_threshold_is_strict() {
        let rows = vec![topic("p", 1, 0.1), topic("p", 2, 0.6), topic("p", 3, 0.3)];
        let selected = select_topics(rows, SelectBy::Threshold(0.3));
        let ids: Vec<TopicId> = selected.iter().map(|r| r.topic_id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_topic_layer_interest() {
        let mut corpus = MemoryCorpus::new();
        corpus
            .add_topic("p1", 1, 0.8)
            .add_topic("p1", 2, 0.2)
            .add_topic("p2", 3, 0.9)
            .add_topic("p3", 3, 0.7)
            .add_topic("p4", 3, 0.5);

        let layer = build_topic_layer(
            &corpus,
            &papers(&["p1", "p2", "p3", "p4", "p5"]),
            TopicParams {
                selection: SelectBy::TopN(2),
                statistic: CooccurrenceStatistic::Interest,
                min_score: 0.5,
            },
        )
        .await
        .unwrap();

        assert_eq!(layer.nodes, vec![1, 2, 3]);
        assert!(!layer.is_symmetric());
        // 1 -> 2 and 2 -> 1 both score 1 - 1/4 = 0.75
        assert_eq!(layer.cooccurrences.len(), 2);
        assert!(layer.cooccurrences.iter().all(|e| e.weight == 1.0));

        let share = layer
            .memberships
            .iter()
            .find(|e| e.source == "p2" && e.target == 3)
            .unwrap();
        assert_eq!(share.weight, 1.0);
    }

    #[tokio::test]
    async fn test_negative_interest_never_becomes_an_edge() {
        // 1 and 2 meet once while each is common elsewhere: 1 -> 2 and 2 -> 1
        // both score below zero
        let mut corpus = MemoryCorpus::new();
        corpus
            .add_topic("p1", 1, 0.5)
            .add_topic("p1", 2, 0.5)
            .add_topic("p2", 1, 0.5)
            .add_topic("p3", 1, 0.5)
            .add_topic("p4", 2, 0.5)
            .add_topic("p4", 3, 0.5)
            .add_topic("p5", 2, 0.5)
            .add_topic("p5", 3, 0.5);

        let layer = build_topic_layer(
            &corpus,
            &papers(&["p1", "p2", "p3", "p4", "p5"]),
            TopicParams {
                selection: SelectBy::Threshold(0.0),
                statistic: CooccurrenceStatistic::Interest,
                min_score: -1.0,
            },
        )
        .await
        .unwrap();

        assert!(!layer.cooccurrences.is_empty());
        for edge in &layer.cooccurrences {
            assert!((0.0..=1.0).contains(&edge.weight));
            assert!(!(edge.source == 1 && edge.target == 2));
            assert!(!(edge.source == 2 && edge.target == 1));
        }
    }
}
