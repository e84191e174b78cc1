//! Accuracy metrics for comparing an estimate against ground truth.

use crate::graph::NodeId;
use crate::topk::{sort_descending, PprVector};
use std::collections::HashSet;

/// Largest `|truth(v) - estimate(v)|` over every node present in either vector.
pub fn max_abs_error(truth: &PprVector, estimate: &PprVector) -> f64 {
    truth
        .keys()
        .chain(estimate.keys())
        .map(|v| {
            let t = truth.get(v).copied().unwrap_or(0.0);
            let e = estimate.get(v).copied().unwrap_or(0.0);
            (t - e).abs()
        })
        .fold(0.0, f64::max)
}

/// `|truth ∩ estimate| / |truth|` over node ids. An empty truth set scores 1.
pub fn precision_at_k(truth_topk: &[(NodeId, f64)], est_topk: &[(NodeId, f64)]) -> f64 {
    if truth_topk.is_empty() {
        return 1.0;
    }
    let truth: HashSet<NodeId> = truth_topk.iter().map(|&(v, _)| v).collect();
    let hits = est_topk.iter().filter(|(v, _)| truth.contains(v)).map(|&(v, _)| v).collect::<HashSet<_>>().len();
    hits as f64 / truth.len() as f64
}

/// NDCG of the first `k` entries of `est_topk`, with the true scores as relevance.
///
/// Gain is `2^π − 1` and the discount at rank `i` (1-based) is `log2(i + 1)`. The ideal
/// ordering is the top `k` of `truth`. Returns 1 when the ideal DCG is zero.
pub fn ndcg_at_k(truth: &PprVector, est_topk: &[(NodeId, f64)], k: usize) -> f64 {
    let gain = |pi: f64| pi.exp2() - 1.0;
    let discount = |rank: usize| ((rank + 1) as f64).log2();

    let dcg: f64 = est_topk
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, (v, _))| gain(truth.get(v).copied().unwrap_or(0.0)) / discount(i + 1))
        .sum();

    let mut ideal: Vec<(NodeId, f64)> = truth.iter().map(|(&v, &s)| (v, s)).collect();
    sort_descending(&mut ideal);
    let idcg: f64 = ideal.iter().take(k).enumerate().map(|(i, &(_, s))| gain(s) / discount(i + 1)).sum();

    if idcg <= 0.0 {
        1.0
    } else {
        dcg / idcg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truth() -> PprVector {
        [(1, 0.5), (2, 0.3), (3, 0.15), (4, 0.05)].into_iter().collect()
    }

    #[test]
    fn max_abs_error_counts_missing_nodes() {
        let est: PprVector = [(1, 0.45), (2, 0.3), (5, 0.2)].into_iter().collect();
        assert!((max_abs_error(&truth(), &est) - 0.2).abs() < 1e-15);
    }

    #[test]
    fn precision_is_overlap_fraction() {
        let t = [(1, 0.5), (2, 0.3)];
        assert_eq!(precision_at_k(&t, &[(2, 0.3), (1, 0.5)]), 1.0);
        assert_eq!(precision_at_k(&t, &[(1, 0.5), (3, 0.3)]), 0.5);
        assert_eq!(precision_at_k(&[], &[(3, 0.1)]), 1.0);
    }

    #[test]
    fn ndcg_is_one_for_ideal_order_and_lower_when_swapped() {
        let t = truth();
        let ideal = [(1, 0.5), (2, 0.3), (3, 0.15)];
        assert!((ndcg_at_k(&t, &ideal, 3) - 1.0).abs() < 1e-12);
        let swapped = [(3, 0.5), (2, 0.3), (1, 0.15)];
        let score = ndcg_at_k(&t, &swapped, 3);
        assert!(score < 1.0 && score > 0.0);
    }
}
