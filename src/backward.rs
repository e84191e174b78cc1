//! All-pairs precomputation by backward push (the BASE baseline).
//!
//! One backward push per target `t` yields `π(v, t)` for every source `v` at once;
//! transposing those columns gives each source's vector, which is written to the store.
//! Queries are then pure lookups through [`Preprocessed`].

use crate::config::BackwardConfig;
use crate::estimator::{write_record, PreprocessReport, Preprocessable, Preprocessed, Progress};
use crate::graph::{GraphView, NodeId};
use crate::push::backward_push;
use crate::store::PprStore;
use crate::topk::{select_top_k, sort_descending, PprVector};
use crate::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// `all_pairs[source][target] = π(source, target)`, internal indices.
pub type AllPairs = BTreeMap<usize, BTreeMap<usize, f64>>;

pub struct BackwardAllPairs<'g, G> {
    graph: &'g G,
    config: BackwardConfig,
}

/// Sources whose backward-push reserve towards `target` reaches `threshold`.
fn column<G: GraphView>(graph: &G, target: usize, alpha: f64, threshold: f64) -> Vec<(usize, f64)> {
    backward_push(graph, target, alpha, threshold)
        .reserve
        .into_iter()
        .filter(|&(_, pi)| pi >= threshold)
        .collect()
}

fn transpose_into(all_pairs: &mut AllPairs, target: usize, column: Vec<(usize, f64)>) {
    for (source, pi) in column {
        all_pairs.entry(source).or_default().insert(target, pi);
    }
}

impl<'g, G: GraphView> BackwardAllPairs<'g, G> {
    pub fn new(graph: &'g G, config: BackwardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { graph, config })
    }

    pub fn config(&self) -> &BackwardConfig {
        &self.config
    }

    /// Run one backward push per target and transpose the results.
    pub fn all_pairs(&self) -> AllPairs {
        let ns = self.namespace();
        let mut progress = Progress::new(&ns, self.graph.node_count());
        let mut all_pairs = AllPairs::new();
        for t in self.graph.nodes() {
            let col = column(self.graph, t, self.config.alpha, self.config.threshold);
            transpose_into(&mut all_pairs, t, col);
            progress.tick();
        }
        all_pairs
    }

    /// Lookup estimator over this configuration's namespace in `store`.
    pub fn reader<'s, S: PprStore + ?Sized>(&self, store: &'s S) -> Preprocessed<'s, S> {
        Preprocessed::new(store, self.namespace(), self.config.seed)
    }

    fn write_all<S: PprStore + ?Sized>(&self, all_pairs: AllPairs, store: &mut S) -> PreprocessReport {
        let mut report = PreprocessReport { namespace: self.namespace(), ..Default::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        for (source, row) in all_pairs {
            let scores: PprVector = row.into_iter().map(|(t, pi)| (self.graph.to_external(t), pi)).collect();
            let entries = match self.config.keep_top_k {
                Some(k) => select_top_k(&scores, k, &mut rng),
                None => {
                    let mut all: Vec<(NodeId, f64)> = scores.into_iter().collect();
                    sort_descending(&mut all);
                    all
                }
            };
            write_record(store, &mut report, self.graph.to_external(source), &entries);
        }
        info!(
            namespace = %report.namespace,
            written = report.records_written,
            failed = report.failures.len(),
            "preprocessing finished"
        );
        report
    }

    fn clear<S: PprStore + ?Sized>(&self, store: &mut S) {
        let ns = self.namespace();
        if let Err(e) = store.delete(&ns) {
            warn!(namespace = %ns, error = %e, "failed to clear namespace before preprocessing");
        }
    }
}

#[cfg(feature = "parallel")]
impl<G: GraphView + Sync> BackwardAllPairs<'_, G> {
    /// [`Self::all_pairs`] with targets pushed in parallel.
    ///
    /// Each target's push is independent; columns are merged in target order, so the
    /// result does not depend on the rayon thread count.
    pub fn all_pairs_parallel(&self) -> AllPairs {
        use rayon::prelude::*;

        let (alpha, threshold) = (self.config.alpha, self.config.threshold);
        let columns: Vec<Vec<(usize, f64)>> =
            self.graph.nodes().into_par_iter().map(|t| column(self.graph, t, alpha, threshold)).collect();
        let mut all_pairs = AllPairs::new();
        for (t, col) in columns.into_iter().enumerate() {
            transpose_into(&mut all_pairs, t, col);
        }
        all_pairs
    }

    pub fn preprocess_parallel<S: PprStore + ?Sized>(&mut self, store: &mut S) -> Result<PreprocessReport> {
        self.clear(store);
        info!(namespace = %self.namespace(), total = self.graph.node_count(), "parallel preprocessing started");
        let all_pairs = self.all_pairs_parallel();
        Ok(self.write_all(all_pairs, store))
    }
}

impl<G: GraphView> Preprocessable for BackwardAllPairs<'_, G> {
    fn namespace(&self) -> String {
        match self.config.keep_top_k {
            Some(k) => format!("BASE/{}_{}", self.config.threshold, k),
            None => format!("BASE/{}_all", self.config.threshold),
        }
    }

    fn preprocess<S: PprStore + ?Sized>(&mut self, store: &mut S) -> Result<PreprocessReport> {
        self.clear(store);
        let all_pairs = self.all_pairs();
        Ok(self.write_all(all_pairs, store))
    }
}
