//! Ranking utilities: k-th order statistic and tie-inclusive top-k selection.

use crate::graph::{GraphView, NodeId};
use ordered_float::OrderedFloat;
use rand::Rng;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Sparse scores keyed by internal index. Absent entries are zero.
///
/// Ordered so that iterating (and sampling walks from) a residue map consumes the
/// RNG in the same order on every run.
pub type SparseVector = BTreeMap<usize, f64>;

/// Sparse scores keyed by external node id.
pub type PprVector = BTreeMap<NodeId, f64>;

/// Return the k-th largest value (1-based) using randomized quickselect.
///
/// `values` is reordered in place. Returns `None` when `k == 0` or `k > values.len()`;
/// callers treat that as "fewer than k available" and keep everything.
pub fn kth_largest<R: Rng + ?Sized>(values: &mut [f64], k: usize, rng: &mut R) -> Option<f64> {
    if k == 0 || k > values.len() {
        return None;
    }
    let mut left = 0usize;
    let mut right = values.len() - 1;
    let mut k = k;
    loop {
        let pos = partition(values, left, right, rng);
        let offset = pos - left;
        if offset == k - 1 {
            return Some(values[pos]);
        }
        if offset > k - 1 {
            right = pos - 1;
        } else {
            k -= offset + 1;
            left = pos + 1;
        }
    }
}

/// Partition `values[left..=right]` around a uniformly random pivot so that larger
/// elements precede it. Returns the pivot's final position.
fn partition<R: Rng + ?Sized>(values: &mut [f64], left: usize, right: usize, rng: &mut R) -> usize {
    let pivot_index = left + rng.random_range(0..=right - left);
    values.swap(pivot_index, right);
    let pivot = values[right];
    let mut i = left;
    for j in left..right {
        if values[j] > pivot {
            values.swap(i, j);
            i += 1;
        }
    }
    values.swap(i, right);
    i
}

/// Every entry scoring at least the k-th largest score, sorted descending.
///
/// The result can be longer than `k` (ties at the k-th score are all kept), and is the
/// whole input when fewer than `k` entries exist. Ties are ordered by ascending id.
pub fn select_top_k<R: Rng + ?Sized>(scores: &PprVector, k: usize, rng: &mut R) -> Vec<(NodeId, f64)> {
    if k == 0 {
        return Vec::new();
    }
    let mut values: Vec<f64> = scores.values().copied().collect();
    let mut out: Vec<(NodeId, f64)> = match kth_largest(&mut values, k, rng) {
        Some(kth) => scores.iter().filter(|(_, &s)| s >= kth).map(|(&id, &s)| (id, s)).collect(),
        None => scores.iter().map(|(&id, &s)| (id, s)).collect(),
    };
    sort_descending(&mut out);
    out
}

/// Sort `(id, score)` pairs by descending score, then ascending id.
pub fn sort_descending(entries: &mut [(NodeId, f64)]) {
    entries.sort_unstable_by_key(|&(id, s)| (Reverse(OrderedFloat(s)), id));
}

/// Translate internal indices to external ids, dropping explicit zeros.
pub fn to_external<G: GraphView>(graph: &G, scores: &SparseVector) -> PprVector {
    scores
        .iter()
        .filter(|(_, &s)| s > 0.0)
        .map(|(&i, &s)| (graph.to_external(i), s))
        .collect()
}
