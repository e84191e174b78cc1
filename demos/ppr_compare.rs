//! Compare the estimators against the power method on one source.
//!
//! ```text
//! cargo run --example ppr_compare -- [edgelist.txt] [source] [k]
//! ```
//!
//! Without an edge list a two-block stochastic block model is generated. Edge lists
//! hold one directed edge per line (`u v`, whitespace-separated); `#` lines are
//! comments. Set `RUST_LOG=fora=debug` to see FORA's push and refinement rounds.

use fora::{
    max_abs_error, ndcg_at_k, precision_at_k, CsrGraph, Fora, ForaConfig, ForaTopK, ForaTopKConfig, ForwardPush,
    ForwardPushConfig, GraphView, MonteCarlo, MonteCarloConfig, NodeId, PowerMethod, PowerMethodConfig,
    TopKEstimator, WholeGraphEstimator, DEFAULT_K,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn sbm_two_block(n: u64, p_in: f64, p_out: f64, seed: u64) -> CsrGraph {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let half = n / 2;
    let mut edges = Vec::new();
    for i in 0..n {
        for j in 0..n {
            let p = if (i < half) == (j < half) { p_in } else { p_out };
            if i != j && rng.random::<f64>() < p {
                edges.push((i, j));
            }
        }
    }
    let nodes: Vec<NodeId> = (0..n).collect();
    CsrGraph::with_nodes(&nodes, &edges).expect("generated edges only use generated ids")
}

fn load_edgelist(path: &Path) -> Result<CsrGraph, String> {
    let txt = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let mut edges = Vec::new();
    for (line_no, line) in txt.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(u), Some(v)) = (parts.next(), parts.next()) else {
            return Err(format!("line {}: expected two node ids", line_no + 1));
        };
        let parse = |s: &str| s.parse::<NodeId>().map_err(|e| format!("line {}: {e}", line_no + 1));
        edges.push((parse(u)?, parse(v)?));
    }
    Ok(CsrGraph::from_edges(&edges))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let graph = match args.first() {
        Some(path) => load_edgelist(Path::new(path))?,
        None => sbm_two_block(400, 0.05, 0.005, 7),
    };
    let source: NodeId = match args.get(1) {
        Some(s) => s.parse()?,
        None => graph.to_external(0),
    };
    let k: usize = match args.get(2) {
        Some(s) => s.parse()?,
        None => DEFAULT_K,
    };
    println!("graph: n={} m={} source={source} k={k}", graph.node_count(), graph.edge_count());

    let mut oracle = PowerMethod::new(&graph, PowerMethodConfig::default())?;
    let truth = oracle.whole_graph(source)?;
    let truth_topk = oracle.top_k(source, k)?;

    let mut whole: Vec<(&str, Box<dyn WholeGraphEstimator + '_>)> = vec![
        ("monte_carlo", Box::new(MonteCarlo::new(&graph, MonteCarloConfig::default())?)),
        ("forward_push", Box::new(ForwardPush::new(&graph, ForwardPushConfig::default())?)),
        ("fora", Box::new(Fora::new(&graph, ForaConfig::default())?)),
    ];
    for (name, est) in whole.iter_mut() {
        let t0 = Instant::now();
        let scores = est.whole_graph(source)?;
        println!("{name:>14}: max_abs_error={:.3e} time={:?}", max_abs_error(&truth, &scores), t0.elapsed());
    }

    let mut topk = ForaTopK::new(&graph, ForaTopKConfig::default())?;
    let t0 = Instant::now();
    let run = topk.run(source, k)?;
    println!(
        "{:>14}: precision={:.3} ndcg={:.3} rounds={} time={:?}",
        "fora_topk",
        precision_at_k(&truth_topk, &run.entries),
        ndcg_at_k(&truth, &run.entries, k),
        run.rounds.len(),
        t0.elapsed()
    );
    for r in &run.rounds {
        println!("    delta={:.3e} rmax={:.3e} walks={} kth={:.3e}", r.delta, r.rmax, r.walks, r.kth);
    }
    Ok(())
}
