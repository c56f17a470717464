use super::report_layer;
use crate::collab::CorpusStore;
use crate::model::{sorted_pair, AuthorId, PubId, WeightedEdge};
use crate::normalize::normalize_edges;
use litgraph_common::config::CoauthorshipSource;
use litgraph_common::errors::Result;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct AuthorLayer {
    /// Sorted author ids
    pub nodes: Vec<AuthorId>,

    /// Co-authorships with the smaller id as source, normalized
    pub coauthorships: Vec<WeightedEdge<AuthorId>>,

    /// Publication -> author, weight 1.0
    pub authorships: Vec<WeightedEdge<PubId, AuthorId>>,
}

/// `1 + ln(n)` for `n` shared papers
pub fn coauthorship_weight(npapers: i64) -> f64 {
    1.0 + (npapers as f64).ln()
}

/// Authors of the given publications and their co-authorship ties
pub async fn build_author_layer(
    store: &dyn CorpusStore,
    papers: &[PubId],
    source: CoauthorshipSource,
) -> Result<AuthorLayer> {
    let mut authors = BTreeSet::new();
    let mut authorships = Vec::new();

    for paper in papers {
        let paper_authors: BTreeSet<AuthorId> = store.authors_of(paper).await?.into_iter().collect();
        for author in paper_authors {
            authorships.push(WeightedEdge::new(paper.clone(), author, 1.0));
            authors.insert(author);
        }
    }

    let counts = match source {
        CoauthorshipSource::Cached => cached_counts(store, &authors).await?,
        CoauthorshipSource::Computed => computed_counts(store, &authors).await?,
    };

    let coauthorships: Vec<WeightedEdge<AuthorId>> = counts
        .into_iter()
        .filter(|&(_, npapers)| npapers >= 1)
        .map(|((a, b), npapers)| WeightedEdge::new(a, b, coauthorship_weight(npapers)))
        .collect();

    let coauthorships = normalize_edges(coauthorships);
    let authorships = normalize_edges(authorships);
    let nodes: Vec<AuthorId> = authors.into_iter().collect();

    report_layer(
        "authors",
        nodes.len(),
        coauthorships.len(),
        coauthorships.len() + authorships.len(),
    );

    Ok(AuthorLayer {
        nodes,
        coauthorships,
        authorships,
    })
}

/// Shared-paper counts from the pre-aggregated table
async fn cached_counts(
    store: &dyn CorpusStore,
    authors: &BTreeSet<AuthorId>,
) -> Result<BTreeMap<(AuthorId, AuthorId), i64>> {
    let mut counts = BTreeMap::new();
    for &author in authors {
        for row in store.coauthorship_counts(author).await? {
            if row.author1 == row.author2
                || !authors.contains(&row.author1)
                || !authors.contains(&row.author2)
            {
                continue;
            }
            counts.insert(sorted_pair(row.author1, row.author2), row.npapers);
        }
    }

    debug!(pairs = counts.len(), "Co-authorships from cached counts");
    Ok(counts)
}

/// Shared-paper counts from the authorship relation; each pair is counted
/// from its smaller author only
async fn computed_counts(
    store: &dyn CorpusStore,
    authors: &BTreeSet<AuthorId>,
) -> Result<BTreeMap<(AuthorId, AuthorId), i64>> {
    let mut counts = BTreeMap::new();
    for &author in authors {
        for coauthor in store.shared_paper_coauthors(author).await? {
            if coauthor > author && authors.contains(&coauthor) {
                *counts.entry((author, coauthor)).or_insert(0) += 1;
            }
        }
    }

    debug!(pairs = counts.len(), "Co-authorships computed from authorships");
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::MemoryCorpus;

    fn corpus() -> MemoryCorpus {
        let mut corpus = MemoryCorpus::new();
        // authors 1 and 2 share four papers, 2 and 3 share one
        for paper in ["p1", "p2", "p3", "p4"] {
            corpus.add_authorship(paper, 1).add_authorship(paper, 2);
        }
        corpus.add_authorship("p5", 2).add_authorship("p5", 3);
        // 4 only co-authors outside the layer
        corpus.add_authorship("p9", 3).add_authorship("p9", 4);
        corpus
    }

    fn papers() -> Vec<PubId> {
        ["p1", "p2", "p3", "p4", "p5"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_weights() {
        assert_eq!(coauthorship_weight(1), 1.0);
        assert!((coauthorship_weight(4) - 2.386294).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_sources_agree() {
        let corpus = corpus();
        let cached = build_author_layer(&corpus, &papers(), CoauthorshipSource::Cached)
            .await
            .unwrap();
        let computed = build_author_layer(&corpus, &papers(), CoauthorshipSource::Computed)
            .await
            .unwrap();

        assert_eq!(cached.nodes, vec![1, 2, 3]);
        assert_eq!(cached.coauthorships, computed.coauthorships);
        assert_eq!(cached.authorships.len(), 10);
    }

    #[tokio::test]
    async fn test_pairs_are_canonical_and_normalized() {
        let corpus = corpus();
        let layer = build_author_layer(&corpus, &papers(), CoauthorshipSource::Computed)
            .await
            .unwrap();

        assert_eq!(layer.coauthorships.len(), 2);
        let strong = &layer.coauthorships[0];
        assert_eq!((strong.source, strong.target), (1, 2));
        assert_eq!(strong.weight, 1.0);

        let weak = &layer.coauthorships[1];
        assert_eq!((weak.source, weak.target), (2, 3));
        assert!((weak.weight - 1.0 / coauthorship_weight(4)).abs() < 1e-12);

        assert!(layer.coauthorships.iter().all(|e| e.source < e.target));
    }

    #[tokio::test]
    async fn test_no_papers() {
        let corpus = corpus();
        let layer = build_author_layer(&corpus, &[], CoauthorshipSource::Cached)
            .await
            .unwrap();
        assert!(layer.nodes.is_empty());
        assert!(layer.coauthorships.is_empty());
    }
}
