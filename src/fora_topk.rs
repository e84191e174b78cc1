//! FORA for top-k queries: adaptive refinement over a shrinking δ.
//!
//! Each round lowers the push threshold for the current δ, continues the same push
//! (the frontier is carried in a [`PushState`]), re-samples walks on the residue, and
//! checks whether the k-th estimate already clears `(1 + ε')·δ`. If not, δ shrinks by 4
//! down to the `1/n` floor.

use crate::config::{ForaTopKConfig, StatParams, TopKParams};
use crate::estimator::{check_k, TopKEstimator};
use crate::graph::{GraphView, NodeId};
use crate::push::{add, forward_push_topk, PushState};
use crate::random_walk::RandomWalkSampler;
use crate::topk::{kth_largest, select_top_k, to_external, PprVector, SparseVector};
use crate::Result;
use tracing::debug;

/// Per-round record of a top-k query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundTrace {
    pub delta: f64,
    pub rmax: f64,
    pub omega: f64,
    pub walks: usize,
    /// k-th largest estimate of the round (0 when fewer than k nodes have scores).
    pub kth: f64,
    /// Deferred nodes carried into the next round.
    pub frontier: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TopKRun {
    /// Tie-inclusive top-k, sorted descending.
    pub entries: Vec<(NodeId, f64)>,
    /// The final round's full estimate.
    pub scores: PprVector,
    /// One entry per refinement round; empty when the source short-circuits.
    pub rounds: Vec<RoundTrace>,
}

pub struct ForaTopK<'g, G> {
    graph: &'g G,
    config: ForaTopKConfig,
    sampler: RandomWalkSampler,
}

impl<'g, G: GraphView> ForaTopK<'g, G> {
    pub fn new(graph: &'g G, config: ForaTopKConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { graph, config, sampler: RandomWalkSampler::new(config.alpha, config.seed) })
    }

    pub fn config(&self) -> &ForaTopKConfig {
        &self.config
    }

    pub fn run(&mut self, source: NodeId, k: usize) -> Result<TopKRun> {
        self.run_with_floor_rounds(source, k, 0)
    }

    /// Like [`run`](Self::run), then runs `extra` more rounds at the floor δ on the same
    /// push state. The returned entries and scores come from the last round.
    pub fn run_with_floor_rounds(&mut self, source: NodeId, k: usize, extra: usize) -> Result<TopKRun> {
        check_k(k)?;
        let s = self.graph.resolve(source)?;
        if self.graph.out_degree(s) == 0 {
            let scores: PprVector = [(source, 1.0)].into_iter().collect();
            return Ok(TopKRun { entries: vec![(source, 1.0)], scores, rounds: Vec::new() });
        }

        let n = self.graph.node_count();
        let m = self.graph.edge_count();
        let params = self.config.derive(n, m, k)?;

        let mut state = PushState::new();
        let mut rounds = Vec::new();
        let mut delta = params.initial_delta;
        let mut estimate = loop {
            let (estimate, trace) = self.round(s, k, delta, &params, &mut state)?;
            rounds.push(trace);
            if trace.kth >= (1.0 + params.epsilon) * delta || delta <= params.min_delta {
                break estimate;
            }
            delta = (delta / 4.0).max(params.min_delta);
        };
        for _ in 0..extra {
            let (next, trace) = self.round(s, k, params.min_delta, &params, &mut state)?;
            rounds.push(trace);
            estimate = next;
        }

        let scores = to_external(self.graph, &estimate);
        let entries = select_top_k(&scores, k, self.sampler.rng_mut());
        Ok(TopKRun { entries, scores, rounds })
    }

    /// One refinement round at `delta`: continue the push, then re-sample walks on the residue.
    fn round(
        &mut self,
        s: usize,
        k: usize,
        delta: f64,
        params: &TopKParams,
        state: &mut PushState,
    ) -> Result<(SparseVector, RoundTrace)> {
        let alpha = self.config.alpha;
        let m = self.graph.edge_count();
        let stat = StatParams::new(alpha, params.epsilon, delta, params.pfail)?;
        let rmax = stat.topk_rmax(m);
        let omega = stat.fora_walks();
        forward_push_topk(self.graph, s, alpha, rmax, params.min_rmax, state);

        let mut estimate = state.reserve.clone();
        let budget = omega * state.rsum * (1.0 - alpha);
        let mut walks = 0usize;
        for (&v, &r) in &state.residue {
            if r <= 0.0 {
                continue;
            }
            let count = (r * budget).ceil() as usize;
            if count == 0 {
                continue;
            }
            let weight = r / count as f64;
            for _ in 0..count {
                let end = self.sampler.walk(self.graph, v, s);
                add(&mut estimate, end, weight);
            }
            walks += count;
        }

        let mut values: Vec<f64> = estimate.values().copied().collect();
        let kth = kth_largest(&mut values, k, self.sampler.rng_mut()).unwrap_or(0.0);
        let trace = RoundTrace { delta, rmax, omega, walks, kth, frontier: state.frontier_len() };
        debug!(delta, rmax, omega, walks, kth, rsum = state.rsum, "fora top-k round");
        Ok((estimate, trace))
    }
}

impl<G: GraphView> TopKEstimator for ForaTopK<'_, G> {
    fn top_k(&mut self, source: NodeId, k: usize) -> Result<Vec<(NodeId, f64)>> {
        Ok(self.run(source, k)?.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CsrGraph;

    #[test]
    fn delta_never_grows_and_stops_by_floor() {
        let edges: Vec<(NodeId, NodeId)> = (0..20).flat_map(|i| [(i, (i + 1) % 20), (i, (i + 7) % 20)]).collect();
        let g = CsrGraph::from_edges(&edges);
        let mut topk = ForaTopK::new(&g, ForaTopKConfig::default()).unwrap();
        assert_eq!(topk.config().epsilon, 0.5);
        let run = topk.run(0, 5).unwrap();
        assert!(!run.rounds.is_empty());
        for w in run.rounds.windows(2) {
            assert!(w[1].delta <= w[0].delta);
        }
        let last = run.rounds[run.rounds.len() - 1];
        assert!(last.kth >= 1.25 * last.delta || last.delta <= 1.0 / 20.0 + 1e-15);
        assert!(run.entries.len() >= 5);
        let total: f64 = run.scores.values().sum();
        assert!((total - 1.0).abs() < 1e-9, "total={total}");
    }

    #[test]
    fn dangling_source_short_circuits() {
        let g = CsrGraph::with_nodes(&[3, 4], &[(4, 3)]).unwrap();
        let mut topk = ForaTopK::new(&g, ForaTopKConfig::default()).unwrap();
        let run = topk.run(3, 2).unwrap();
        assert_eq!(run.entries, vec![(3, 1.0)]);
        assert!(run.rounds.is_empty());
    }

    #[test]
    fn zero_k_is_rejected() {
        let g = CsrGraph::from_edges(&[(0, 1), (1, 0)]);
        let mut topk = ForaTopK::new(&g, ForaTopKConfig::default()).unwrap();
        assert!(topk.top_k(0, 0).is_err());
    }
}
