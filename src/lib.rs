//! `fora`: Personalized PageRank (PPR) estimation.
//!
//! Estimators for the PPR vector of a source node on a read-only directed graph:
//! - local **push** propagation (forward and backward)
//! - **Monte-Carlo** random walks with restart
//! - **FORA** (push, then walks on the leftover residue), whole-graph and adaptive top-k
//! - an all-pairs **backward push** precomputation baseline
//! - a fixed-iteration **power method** oracle for scoring the others
//!
//! Public invariants (must not drift):
//! - **Mass conservation**: an untruncated forward push keeps `Σ reserve + Σ residue = 1`.
//! - **Unbiasedness**: sampled walk contributions have expectation equal to the residue
//!   they replace.
//! - **Ties**: top-k results include every node tied with the k-th score.
//! - **Determinism**: every randomized estimator is reproducible given its config seed.

pub mod backward;
pub mod config;
pub mod estimator;
pub mod fora;
pub mod fora_topk;
pub mod forward_push;
pub mod graph;
pub mod metrics;
pub mod monte_carlo;
pub mod ppr;
pub mod push;
pub mod random_walk;
pub mod store;
pub mod topk;

pub use backward::BackwardAllPairs;
pub use config::{
    BackwardConfig, ForaConfig, ForaTopKConfig, ForwardPushConfig, MonteCarloConfig,
    PowerMethodConfig, StatParams, DEFAULT_ALPHA, DEFAULT_EPSILON, DEFAULT_K,
};
pub use estimator::{
    preprocess_whole_graph, read_preprocessed, PreprocessReport, Preprocessable, Preprocessed,
    TopKEstimator, WholeGraphEstimator,
};
pub use fora::Fora;
pub use fora_topk::{ForaTopK, RoundTrace, TopKRun};
pub use forward_push::ForwardPush;
pub use graph::{CsrGraph, Direction, GraphView, NodeId};
pub use metrics::{max_abs_error, ndcg_at_k, precision_at_k};
pub use monte_carlo::MonteCarlo;
pub use ppr::PowerMethod;
pub use push::{backward_push, forward_push, forward_push_topk, push, PushOutcome, PushState};
pub use random_walk::{walk, walk_skip_first_stop, RandomWalkSampler};
pub use store::{DirStore, MemoryStore, PprStore};
pub use topk::{kth_largest, select_top_k, PprVector, SparseVector};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unknown node id: {0}")]
    UnknownNode(NodeId),
    #[error("no preprocessed record for node {0}")]
    NotPreprocessed(NodeId),
    #[error("persistence failure for {key}: {source}")]
    Persistence {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt record {key}: {line:?}")]
    Corrupt { key: String, line: String },
}

pub type Result<T> = std::result::Result<T, Error>;
