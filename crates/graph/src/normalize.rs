//! Per-layer edge weight normalization

use crate::model::WeightedEdge;
use tracing::{debug, warn};

/// Divide every weight by the largest one so the layer lies in `[0, 1]`.
///
/// Negative and non-finite weights are first set to `0.0`. An empty layer
/// stays empty. A layer whose largest weight is not positive is returned
/// with every weight at `0.0`.
pub fn normalize_edges<S, T>(mut edges: Vec<WeightedEdge<S, T>>) -> Vec<WeightedEdge<S, T>> {
    let mut invalid = 0usize;
    for edge in edges.iter_mut() {
        if !edge.weight.is_finite() || edge.weight < 0.0 {
            edge.weight = 0.0;
            invalid += 1;
        }
    }
    if invalid > 0 {
        warn!(invalid, "Negative or non-finite edge weights set to zero");
    }

    let wmax = edges.iter().map(|e| e.weight).fold(0.0_f64, f64::max);

    if wmax <= 0.0 {
        if !edges.is_empty() {
            debug!(edges = edges.len(), "All edge weights are zero, skipping normalization");
        }
        return edges;
    }

    edges
        .into_iter()
        .map(|mut edge| {
            edge.weight /= wmax;
            edge
        })
        .collect()
}

/// Pairwise edges per node, reported for observability only
pub fn density(pairwise_edges: usize, nodes: usize) -> f64 {
    if nodes == 0 {
        0.0
    } else {
        pairwise_edges as f64 / nodes as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_scales_to_one() {
        let edges = vec![
            WeightedEdge::new("a", "b", 2.0),
            WeightedEdge::new("b", "c", 4.0),
            WeightedEdge::new("c", "a", 1.0),
        ];
        let normalized = normalize_edges(edges);

        let weights: Vec<f64> = normalized.iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![0.5, 1.0, 0.25]);
        assert_eq!(normalized[0].source, "a");
    }

    #[test]
    fn test_normalize_empty() {
        let edges: Vec<WeightedEdge<i64>> = vec![];
        assert!(normalize_edges(edges).is_empty());
    }

    #[test]
    fn test_normalize_all_zero() {
        let edges = vec![WeightedEdge::new(1, 2, 0.0), WeightedEdge::new(2, 3, 0.0)];
        let normalized = normalize_edges(edges.clone());
        assert_eq!(normalized, edges);
    }

    #[test]
    fn test_invalid_weights_become_zero() {
        let edges = vec![
            WeightedEdge::new(1, 2, -0.6),
            WeightedEdge::new(2, 1, f64::NAN),
            WeightedEdge::new(3, 2, 0.4),
            WeightedEdge::new(3, 1, f64::INFINITY),
        ];
        let weights: Vec<f64> = normalize_edges(edges).iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![0.0, 0.0, 1.0, 0.0]);

        let only_negative = normalize_edges(vec![WeightedEdge::new(1, 2, -1.0)]);
        assert_eq!(only_negative[0].weight, 0.0);
    }

    #[test]
    fn test_density() {
        assert_eq!(density(3, 2), 1.5);
        assert_eq!(density(5, 0), 0.0);
    }
}
