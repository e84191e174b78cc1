//! FORA for whole-graph queries: forward push, then walks on the leftover residue.
//!
//! Push gives a cheap, biased-low reserve; each residual node then spends walks in
//! proportion to its residue, which makes the final estimate unbiased. rmax trades one
//! phase against the other: it is halved (and push re-run from scratch) while the push
//! cost so far is still below the expected cost of the walk phase.

use crate::config::{ForaConfig, StatParams};
use crate::estimator::{preprocess_whole_graph, PreprocessReport, Preprocessable, WholeGraphEstimator};
use crate::graph::{GraphView, NodeId};
use crate::push::{add, forward_push, PushOutcome};
use crate::random_walk::RandomWalkSampler;
use crate::store::PprStore;
use crate::topk::{to_external, PprVector, SparseVector};
use crate::Result;
use tracing::debug;

/// One whole-graph FORA query, keyed by internal index.
#[derive(Debug, Clone, Default)]
pub struct ForaRun {
    pub scores: SparseVector,
    /// Number of times push was run (1 + number of rmax halvings).
    pub push_rounds: usize,
    /// The rmax of the final push.
    pub rmax: f64,
    /// Total walks sampled on the residue.
    pub walks: usize,
}

pub struct Fora<'g, G> {
    graph: &'g G,
    config: ForaConfig,
    params: StatParams,
    sampler: RandomWalkSampler,
}

impl<'g, G: GraphView> Fora<'g, G> {
    pub fn new(graph: &'g G, config: ForaConfig) -> Result<Self> {
        config.validate()?;
        let params = StatParams::for_graph(config.alpha, config.epsilon, graph.node_count())?;
        Ok(Self { graph, config, params, sampler: RandomWalkSampler::new(config.alpha, config.seed) })
    }

    pub fn config(&self) -> &ForaConfig {
        &self.config
    }

    pub fn params(&self) -> &StatParams {
        &self.params
    }

    /// Push phase: returns the final push outcome, its rmax, and the number of runs.
    fn push_phase(&self, source: usize) -> (PushOutcome, f64, usize) {
        let alpha = self.config.alpha;
        let omega = self.params.fora_walks();
        let mut rmax = self.params.fora_rmax(self.graph.edge_count());
        let mut push_cost = 0usize;
        let mut rounds = 0usize;
        loop {
            let out = forward_push(self.graph, source, alpha, rmax);
            rounds += 1;
            push_cost += out.edge_pushes;
            // Expected walk length is 1/α steps.
            let walk_cost = out.rsum * (1.0 - alpha) * omega / alpha;
            debug!(round = rounds, rmax, rsum = out.rsum, push_cost, walk_cost, "fora push");
            let next = rmax * 0.5;
            if out.rsum <= 0.0 || push_cost as f64 >= walk_cost || next <= f64::MIN_POSITIVE {
                return (out, rmax, rounds);
            }
            rmax = next;
        }
    }

    pub fn whole_graph_run(&mut self, source: NodeId) -> Result<ForaRun> {
        let s = self.graph.resolve(source)?;
        let alpha = self.config.alpha;
        let omega = self.params.fora_walks();
        let (out, rmax, push_rounds) = self.push_phase(s);

        let PushOutcome { mut reserve, residue, .. } = out;
        let mut walked = SparseVector::new();
        let mut walks = 0usize;
        for (&v, &r) in &residue {
            if r <= 0.0 {
                continue;
            }
            add(&mut reserve, v, alpha * r);
            let remaining = (1.0 - alpha) * r;
            let count = (remaining * omega).ceil() as usize;
            if count == 0 {
                continue;
            }
            let weight = remaining / count as f64;
            for _ in 0..count {
                let end = self.sampler.walk_skip_first_stop(self.graph, v, s);
                add(&mut walked, end, weight);
            }
            walks += count;
        }
        for (v, w) in walked {
            add(&mut reserve, v, w);
        }

        Ok(ForaRun { scores: reserve, push_rounds, rmax, walks })
    }
}

impl<G: GraphView> WholeGraphEstimator for Fora<'_, G> {
    fn whole_graph(&mut self, source: NodeId) -> Result<PprVector> {
        let run = self.whole_graph_run(source)?;
        Ok(to_external(self.graph, &run.scores))
    }
}

impl<G: GraphView> Preprocessable for Fora<'_, G> {
    fn namespace(&self) -> String {
        format!("FORA/{}", self.config.epsilon)
    }

    fn preprocess<S: PprStore + ?Sized>(&mut self, store: &mut S) -> Result<PreprocessReport> {
        let sources: Vec<NodeId> = self.graph.nodes().map(|i| self.graph.to_external(i)).collect();
        let namespace = self.namespace();
        preprocess_whole_graph(self, &sources, &namespace, store)
    }
}
