//! Push-only estimator: the reserve of one forward push, with no sampling.
//!
//! The estimate under-counts every node by at most its leftover residue, so the
//! quality is set entirely by `rmax`.

use crate::config::ForwardPushConfig;
use crate::estimator::{check_k, preprocess_whole_graph, PreprocessReport, Preprocessable, TopKEstimator, WholeGraphEstimator};
use crate::graph::{GraphView, NodeId};
use crate::push::{forward_push, PushOutcome};
use crate::store::PprStore;
use crate::topk::{select_top_k, to_external, PprVector};
use crate::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub struct ForwardPush<'g, G> {
    graph: &'g G,
    config: ForwardPushConfig,
    rng: ChaCha8Rng,
}

impl<'g, G: GraphView> ForwardPush<'g, G> {
    pub fn new(graph: &'g G, config: ForwardPushConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { graph, config, rng: ChaCha8Rng::seed_from_u64(config.seed) })
    }

    pub fn config(&self) -> &ForwardPushConfig {
        &self.config
    }

    /// The raw push result, keyed by internal index.
    pub fn run(&self, source: NodeId) -> Result<PushOutcome> {
        let s = self.graph.resolve(source)?;
        Ok(forward_push(self.graph, s, self.config.alpha, self.config.rmax))
    }
}

impl<G: GraphView> WholeGraphEstimator for ForwardPush<'_, G> {
    fn whole_graph(&mut self, source: NodeId) -> Result<PprVector> {
        let out = self.run(source)?;
        Ok(to_external(self.graph, &out.reserve))
    }
}

impl<G: GraphView> TopKEstimator for ForwardPush<'_, G> {
    fn top_k(&mut self, source: NodeId, k: usize) -> Result<Vec<(NodeId, f64)>> {
        check_k(k)?;
        let scores = self.whole_graph(source)?;
        Ok(select_top_k(&scores, k, &mut self.rng))
    }
}

impl<G: GraphView> Preprocessable for ForwardPush<'_, G> {
    fn namespace(&self) -> String {
        format!("FWP/{}", self.config.rmax)
    }

    fn preprocess<S: PprStore + ?Sized>(&mut self, store: &mut S) -> Result<PreprocessReport> {
        let sources: Vec<NodeId> = self.graph.nodes().map(|i| self.graph.to_external(i)).collect();
        let namespace = self.namespace();
        preprocess_whole_graph(self, &sources, &namespace, store)
    }
}
