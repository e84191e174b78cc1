//! Capability traits shared by the estimators.
//!
//! Not every algorithm supports every query shape, so each capability is its own trait:
//!
//! | estimator            | whole-graph | top-k | preprocess |
//! |----------------------|-------------|-------|------------|
//! | `MonteCarlo`         | yes         | yes   | yes        |
//! | `ForwardPush`        | yes         | yes   | yes        |
//! | `Fora`               | yes         | -     | yes        |
//! | `ForaTopK`           | -           | yes   | -          |
//! | `PowerMethod`        | yes         | yes   | -          |
//! | `BackwardAllPairs`   | -           | -     | yes        |
//! | `Preprocessed`       | yes         | yes   | -          |

use crate::graph::NodeId;
use crate::store::PprStore;
use crate::topk::{select_top_k, PprVector};
use crate::{Error, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

/// Single-source queries returning the whole (sparse) PPR vector.
pub trait WholeGraphEstimator {
    fn whole_graph(&mut self, source: NodeId) -> Result<PprVector>;
}

/// Single-source top-k queries.
///
/// The result is sorted by descending score and holds every node tied with the k-th
/// score, so it can be longer than `k`; it is shorter only when fewer nodes have scores.
pub trait TopKEstimator {
    fn top_k(&mut self, source: NodeId, k: usize) -> Result<Vec<(NodeId, f64)>>;
}

/// Algorithms that can precompute per-source vectors into a [`PprStore`].
pub trait Preprocessable {
    /// Namespace the records are written under; encodes the algorithm and its parameters.
    fn namespace(&self) -> String;

    fn preprocess<S: PprStore + ?Sized>(&mut self, store: &mut S) -> Result<PreprocessReport>;
}

/// Outcome of a preprocessing pass.
///
/// Failed writes are skipped, so a pass can complete partially.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreprocessReport {
    pub namespace: String,
    pub records_written: usize,
    pub failures: Vec<NodeId>,
}

impl PreprocessReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Logs preprocessing progress in 10% steps.
pub(crate) struct Progress<'a> {
    label: &'a str,
    total: usize,
    done: usize,
    next_pct: usize,
}

impl<'a> Progress<'a> {
    pub(crate) fn new(label: &'a str, total: usize) -> Self {
        info!(namespace = label, total, "preprocessing started");
        Self { label, total, done: 0, next_pct: 10 }
    }

    pub(crate) fn tick(&mut self) {
        self.done += 1;
        while self.next_pct <= 100 && self.done * 100 >= self.next_pct * self.total {
            info!(namespace = self.label, "progress: {}%", self.next_pct);
            self.next_pct += 10;
        }
    }
}

/// Clear `namespace`, then write the whole-graph vector of every source.
///
/// Estimation errors abort the pass; store failures are logged and skipped.
pub fn preprocess_whole_graph<E, S>(
    estimator: &mut E,
    sources: &[NodeId],
    namespace: &str,
    store: &mut S,
) -> Result<PreprocessReport>
where
    E: WholeGraphEstimator + ?Sized,
    S: PprStore + ?Sized,
{
    if let Err(e) = store.delete(namespace) {
        warn!(namespace, error = %e, "failed to clear namespace before preprocessing");
    }

    let mut report = PreprocessReport { namespace: namespace.to_string(), ..Default::default() };
    let mut progress = Progress::new(namespace, sources.len());
    for &source in sources {
        let scores = estimator.whole_graph(source)?;
        let entries: Vec<(NodeId, f64)> = scores.into_iter().collect();
        write_record(store, &mut report, source, &entries);
        progress.tick();
    }
    info!(namespace, written = report.records_written, failed = report.failures.len(), "preprocessing finished");
    Ok(report)
}

pub(crate) fn write_record<S: PprStore + ?Sized>(
    store: &mut S,
    report: &mut PreprocessReport,
    key: NodeId,
    entries: &[(NodeId, f64)],
) {
    match store.write(&report.namespace, key, entries) {
        Ok(()) => report.records_written += 1,
        Err(e) => {
            warn!(namespace = %report.namespace, key, error = %e, "skipping record");
            report.failures.push(key);
        }
    }
}

/// Read one preprocessed vector. A missing record is [`Error::NotPreprocessed`].
pub fn read_preprocessed<S: PprStore + ?Sized>(store: &S, namespace: &str, source: NodeId) -> Result<PprVector> {
    match store.read(namespace, source)? {
        Some(entries) => Ok(entries.into_iter().collect()),
        None => Err(Error::NotPreprocessed(source)),
    }
}

/// Lookup-only estimator over records written by a [`Preprocessable`] pass.
///
/// There is no fallback computation: read failures and missing records are errors.
pub struct Preprocessed<'s, S: ?Sized> {
    store: &'s S,
    namespace: String,
    rng: ChaCha8Rng,
}

impl<'s, S: PprStore + ?Sized> Preprocessed<'s, S> {
    pub fn new(store: &'s S, namespace: impl Into<String>, seed: u64) -> Self {
        Self { store, namespace: namespace.into(), rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl<S: PprStore + ?Sized> WholeGraphEstimator for Preprocessed<'_, S> {
    fn whole_graph(&mut self, source: NodeId) -> Result<PprVector> {
        read_preprocessed(self.store, &self.namespace, source)
    }
}

impl<S: PprStore + ?Sized> TopKEstimator for Preprocessed<'_, S> {
    fn top_k(&mut self, source: NodeId, k: usize) -> Result<Vec<(NodeId, f64)>> {
        check_k(k)?;
        let scores = read_preprocessed(self.store, &self.namespace, source)?;
        Ok(select_top_k(&scores, k, &mut self.rng))
    }
}

pub(crate) fn check_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::InvalidParameter("k must be >= 1".to_string()));
    }
    Ok(())
}
