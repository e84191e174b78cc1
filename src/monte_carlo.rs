//! Pure Monte-Carlo PPR: the terminal distribution of random walks with restart.

use crate::config::{MonteCarloConfig, StatParams};
use crate::estimator::{check_k, preprocess_whole_graph, PreprocessReport, Preprocessable, TopKEstimator, WholeGraphEstimator};
use crate::graph::{GraphView, NodeId};
use crate::push::add;
use crate::random_walk::RandomWalkSampler;
use crate::store::PprStore;
use crate::topk::{select_top_k, to_external, PprVector, SparseVector};
use crate::Result;

/// Monte-Carlo estimator with `δ = pfail = 1/n`.
///
/// Draws `⌊ω⌋` walks from the source, `ω = 3·ln(2/pfail)/ε²/δ`, and scores each
/// terminal node by `count / ω`.
pub struct MonteCarlo<'g, G> {
    graph: &'g G,
    config: MonteCarloConfig,
    params: StatParams,
    sampler: RandomWalkSampler,
}

impl<'g, G: GraphView> MonteCarlo<'g, G> {
    pub fn new(graph: &'g G, config: MonteCarloConfig) -> Result<Self> {
        config.validate()?;
        let params = StatParams::for_graph(config.alpha, config.epsilon, graph.node_count())?;
        Ok(Self { graph, config, params, sampler: RandomWalkSampler::new(config.alpha, config.seed) })
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// The walk budget ω (the score denominator).
    pub fn walk_budget(&self) -> f64 {
        self.params.monte_carlo_walks()
    }

    fn sample(&mut self, source: usize) -> SparseVector {
        let omega = self.walk_budget();
        let walks = omega.floor() as usize;
        let mut counts = SparseVector::new();
        for _ in 0..walks {
            let end = self.sampler.walk(self.graph, source, source);
            add(&mut counts, end, 1.0);
        }
        for c in counts.values_mut() {
            *c /= omega;
        }
        counts
    }
}

impl<G: GraphView> WholeGraphEstimator for MonteCarlo<'_, G> {
    fn whole_graph(&mut self, source: NodeId) -> Result<PprVector> {
        let s = self.graph.resolve(source)?;
        let scores = self.sample(s);
        Ok(to_external(self.graph, &scores))
    }
}

impl<G: GraphView> TopKEstimator for MonteCarlo<'_, G> {
    fn top_k(&mut self, source: NodeId, k: usize) -> Result<Vec<(NodeId, f64)>> {
        check_k(k)?;
        let scores = self.whole_graph(source)?;
        Ok(select_top_k(&scores, k, self.sampler.rng_mut()))
    }
}

impl<G: GraphView> Preprocessable for MonteCarlo<'_, G> {
    fn namespace(&self) -> String {
        format!("MC/{}", self.config.epsilon)
    }

    fn preprocess<S: PprStore + ?Sized>(&mut self, store: &mut S) -> Result<PreprocessReport> {
        let sources: Vec<NodeId> = self.graph.nodes().map(|i| self.graph.to_external(i)).collect();
        let namespace = self.namespace();
        preprocess_whole_graph(self, &sources, &namespace, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CsrGraph;
    use crate::store::MemoryStore;

    #[test]
    fn scores_are_counts_over_budget() {
        let g = CsrGraph::from_edges(&[(0, 1), (1, 2), (2, 0)]);
        let mut mc = MonteCarlo::new(&g, MonteCarloConfig::default()).unwrap();
        assert_eq!(mc.config().epsilon, 0.5);
        let omega = mc.walk_budget();
        let scores = mc.whole_graph(0).unwrap();
        let total: f64 = scores.values().sum();
        assert!((total - omega.floor() / omega).abs() < 1e-12);
        for &s in scores.values() {
            let count = s * omega;
            assert!((count - count.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn isolated_source_keeps_all_mass() {
        let g = CsrGraph::with_nodes(&[0, 1, 2], &[(1, 2)]).unwrap();
        let mut mc = MonteCarlo::new(&g, MonteCarloConfig::default()).unwrap();
        let scores = mc.whole_graph(0).unwrap();
        assert_eq!(scores.len(), 1);
        assert!(scores[&0] > 0.99);
    }

    #[test]
    fn rejects_bad_config_and_unknown_source() {
        let g = CsrGraph::from_edges(&[(0, 1)]);
        let bad = MonteCarloConfig { epsilon: 0.0, ..Default::default() };
        assert!(MonteCarlo::new(&g, bad).is_err());
        let mut mc = MonteCarlo::new(&g, MonteCarloConfig::default()).unwrap();
        assert!(mc.whole_graph(9).is_err());
        assert!(mc.top_k(0, 0).is_err());
    }

    #[test]
    fn preprocess_writes_every_source() {
        let g = CsrGraph::from_edges(&[(0, 1), (1, 0), (1, 2)]);
        let mut mc = MonteCarlo::new(&g, MonteCarloConfig::default()).unwrap();
        let mut store = MemoryStore::new();
        let report = mc.preprocess(&mut store).unwrap();
        assert_eq!(report.namespace, "MC/0.5");
        assert_eq!(report.records_written, 3);
        assert!(report.is_complete());
        assert_eq!(store.len("MC/0.5"), 3);
    }
}
