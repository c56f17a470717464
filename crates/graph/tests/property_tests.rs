//! Property-based tests for the graph engine building blocks.
//!
//! Invariants covered:
//! - Normalized weights lie in [0, 1] and the maximum maps to 1
//! - Frontier expansion and induced-edge extraction over random relations
//! - Association rules only mention observed items and respect thresholds
//! - Assembled graphs have dense ids

use litgraph_common::config::CooccurrenceStatistic;
use litgraph_graph::assembler::{assemble, GraphLayers};
use litgraph_graph::association::{rules_by_interest, rules_by_lift, ItemsetCounts};
use litgraph_graph::layers::{AuthorLayer, CooccurrenceLayer, PublicationLayer, VenueLayer};
use litgraph_graph::normalize::normalize_edges;
use litgraph_graph::{AdjacencyIndex, CorpusSnapshot, NodeKind, WeightedEdge};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn arb_edges() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..20, 0u8..20), 0..60)
}

fn arb_nodes() -> impl Strategy<Value = HashSet<String>> {
    prop::collection::hash_set((0u8..20).prop_map(|n| n.to_string()), 0..12)
}

/// Layer sizes `(pubs, authors, keywords, venues, topics)` and raw edge
/// endpoints, reduced modulo the layer sizes
fn arb_layer_shape() -> impl Strategy<Value = ((usize, usize, usize, usize, usize), Vec<(usize, usize)>)> {
    (
        (1usize..10, 0usize..8, 0usize..6, 0usize..4, 0usize..5),
        prop::collection::vec((0usize..50, 0usize..50), 0..40),
    )
}

fn layers_of_shape(shape: (usize, usize, usize, usize, usize), pairs: &[(usize, usize)]) -> GraphLayers {
    let (n_pubs, n_authors, n_keywords, n_venues, n_topics) = shape;
    let pub_id = |i: usize| format!("p{}", i % n_pubs);

    let authors: Vec<i64> = (0..n_authors as i64).map(|i| 100 + i).collect();
    let keywords: Vec<String> = (0..n_keywords).map(|i| format!("k{}", i)).collect();
    let venues: Vec<i64> = (0..n_venues as i64).map(|i| 7 + i).collect();
    let topics: Vec<i32> = (0..n_topics as i32).collect();

    let among = |nodes_len: usize| -> Vec<(usize, usize)> {
        if nodes_len == 0 {
            return vec![];
        }
        pairs
            .iter()
            .map(|&(a, b)| (a % nodes_len, b % nodes_len))
            .filter(|(a, b)| a != b)
            .collect()
    };

    GraphLayers {
        publications: PublicationLayer {
            nodes: (0..n_pubs).map(pub_id).collect(),
            citations: among(n_pubs)
                .into_iter()
                .map(|(a, b)| WeightedEdge::new(pub_id(a), pub_id(b), 1.0))
                .collect(),
            query_scores: HashMap::new(),
        },
        authors: AuthorLayer {
            coauthorships: among(n_authors)
                .into_iter()
                .map(|(a, b)| WeightedEdge::new(authors[a], authors[b], 0.5))
                .collect(),
            authorships: authors
                .iter()
                .enumerate()
                .map(|(i, &a)| WeightedEdge::new(pub_id(i), a, 1.0))
                .collect(),
            nodes: authors,
        },
        keywords: CooccurrenceLayer {
            cooccurrences: among(n_keywords)
                .into_iter()
                .map(|(a, b)| WeightedEdge::new(keywords[a].clone(), keywords[b].clone(), 0.5))
                .collect(),
            memberships: keywords
                .iter()
                .enumerate()
                .map(|(i, k)| WeightedEdge::new(pub_id(i), k.clone(), 0.3))
                .collect(),
            nodes: keywords,
            statistic: CooccurrenceStatistic::Lift,
        },
        venues: VenueLayer {
            placements: venues
                .iter()
                .enumerate()
                .map(|(i, &v)| WeightedEdge::new(pub_id(i), v, 1.0))
                .collect(),
            nodes: venues,
        },
        topics: (n_topics > 0).then(|| CooccurrenceLayer {
            cooccurrences: among(n_topics)
                .into_iter()
                .map(|(a, b)| WeightedEdge::new(topics[a], topics[b], 0.2))
                .collect(),
            memberships: topics
                .iter()
                .enumerate()
                .map(|(i, &t)| WeightedEdge::new(pub_id(i), t, 0.4))
                .collect(),
            nodes: topics,
            statistic: CooccurrenceStatistic::Interest,
        }),
    }
}

fn arb_transactions() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(0u8..8, 0..6), 0..30)
}

mod normalize_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn weights_are_unit_bounded(weights in prop::collection::vec(0.0f64..1000.0, 0..50)) {
            let edges: Vec<WeightedEdge<usize>> = weights
                .iter()
                .enumerate()
                .map(|(i, &w)| WeightedEdge::new(i, i + 1, w))
                .collect();

            let normalized = normalize_edges(edges);
            prop_assert_eq!(normalized.len(), weights.len());

            for edge in &normalized {
                prop_assert!(edge.weight >= 0.0 && edge.weight <= 1.0);
            }

            if weights.iter().any(|&w| w > 0.0) {
                let max = normalized.iter().map(|e| e.weight).fold(0.0f64, f64::max);
                prop_assert!((max - 1.0).abs() < 1e-12);
            }
        }
    }
}

mod adjacency_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn follow_is_union_of_singletons(edges in arb_edges(), nodes in arb_nodes()) {
            let index = AdjacencyIndex::from_edges(edges);
            let together = index.follow(&nodes);

            let mut separately = HashSet::new();
            for node in &nodes {
                separately.extend(index.follow(&HashSet::from([node.clone()])));
            }
            prop_assert_eq!(together, separately);
        }

        #[test]
        fn subgraph_stays_inside_node_set(edges in arb_edges(), nodes in arb_nodes()) {
            let index = AdjacencyIndex::from_edges(edges.clone());
            let induced = index.subgraph(&nodes);

            let relation: HashSet<(String, String)> = edges
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect();

            for (u, v) in &induced {
                prop_assert!(u != v);
                prop_assert!(nodes.contains(u) && nodes.contains(v));
                prop_assert!(relation.contains(&(u.clone(), v.clone())));
            }

            // and nothing eligible is missed
            for (u, v) in &relation {
                if u != v && nodes.contains(u) && nodes.contains(v) {
                    prop_assert!(induced.contains(&(u.clone(), v.clone())));
                }
            }
        }

        #[test]
        fn expand_never_enters_exclusions(
            edges in arb_edges(),
            seeds in arb_nodes(),
            exclude in arb_nodes(),
            hops in 0usize..4,
        ) {
            let index = AdjacencyIndex::from_edges(edges);
            let seeds: HashSet<String> = seeds.difference(&exclude).cloned().collect();
            let expanded = index.expand(seeds.clone(), hops, &exclude);

            prop_assert!(expanded.is_superset(&seeds));
            prop_assert!(expanded.is_disjoint(&exclude));

            let more = index.expand(seeds, hops + 1, &exclude);
            prop_assert!(more.is_superset(&expanded));
        }
    }
}

mod association_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn pair_counts_bounded_by_singles(transactions in arb_transactions()) {
            let counts = ItemsetCounts::count(&transactions);
            for ((a, b), &together) in &counts.pairs {
                prop_assert!(a < b);
                prop_assert!(together <= counts.singles[a]);
                prop_assert!(together <= counts.singles[b]);
            }
        }

        #[test]
        fn lift_rules_respect_threshold(transactions in arb_transactions(), min_lift in 0.0f64..3.0) {
            let observed: HashSet<u8> = transactions.iter().flatten().copied().collect();
            for rule in rules_by_lift(&transactions, min_lift) {
                prop_assert!(rule.score >= min_lift);
                prop_assert!(rule.antecedent < rule.consequent);
                prop_assert!(observed.contains(&rule.antecedent));
                prop_assert!(observed.contains(&rule.consequent));
            }
        }

        #[test]
        fn interest_rules_respect_threshold(transactions in arb_transactions(), min in -1.0f64..1.0) {
            let rules = rules_by_interest(&transactions, min);
            for rule in &rules {
                prop_assert!(rule.score >= min);
                prop_assert!(rule.antecedent != rule.consequent);
            }
        }
    }
}

mod assembler_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn assembled_ids_are_dense_in_layer_order((shape, pairs) in arb_layer_shape()) {
            let layers = layers_of_shape(shape, &pairs);
            let graph = assemble(&layers, &CorpusSnapshot::default(), None).unwrap();

            let (n_pubs, n_authors, n_keywords, n_venues, n_topics) = shape;
            let total = n_pubs + n_authors + n_keywords + n_venues + n_topics;

            let petgraph = graph.as_petgraph();
            prop_assert_eq!(petgraph.node_count(), total);
            let indices: Vec<usize> = petgraph.node_indices().map(|i| i.index()).collect();
            prop_assert_eq!(indices, (0..total).collect::<Vec<_>>());

            let mut expected = Vec::with_capacity(total);
            for (kind, count) in [
                (NodeKind::Publication, n_pubs),
                (NodeKind::Author, n_authors),
                (NodeKind::Keyword, n_keywords),
                (NodeKind::Venue, n_venues),
                (NodeKind::Topic, n_topics),
            ] {
                expected.extend(std::iter::repeat(kind).take(count));
                prop_assert_eq!(graph.count_kind(kind), count);
            }
            let kinds: Vec<NodeKind> = graph.nodes().map(|(_, node)| node.kind).collect();
            prop_assert_eq!(kinds, expected);

            for edge in petgraph.edge_indices() {
                let (source, target) = petgraph.edge_endpoints(edge).unwrap();
                prop_assert!(source.index() < total && target.index() < total);
            }
        }
    }
}
