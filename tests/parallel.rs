#![cfg(feature = "parallel")]

use fora::{BackwardAllPairs, BackwardConfig, CsrGraph, MemoryStore, NodeId, PprStore, Preprocessable};

fn graph() -> CsrGraph {
    let edges: Vec<(NodeId, NodeId)> = (0..30).flat_map(|i| [(i, (i + 1) % 30), (i, (i * 7 + 3) % 30)]).collect();
    CsrGraph::from_edges(&edges)
}

#[test]
fn parallel_all_pairs_is_thread_count_invariant() {
    let g = graph();
    let base = BackwardAllPairs::new(&g, BackwardConfig::default()).unwrap();

    let pool1 = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let pool4 = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    let a1 = pool1.install(|| base.all_pairs_parallel());
    let a4 = pool4.install(|| base.all_pairs_parallel());
    assert_eq!(a1, a4, "parallel output must be thread-count invariant");
    assert_eq!(a1, base.all_pairs(), "parallel output must match the sequential pass");
}

#[test]
fn parallel_preprocess_writes_the_same_records() {
    let g = graph();
    let config = BackwardConfig { keep_top_k: Some(5), ..Default::default() };
    let mut seq_store = MemoryStore::new();
    let mut par_store = MemoryStore::new();

    let mut base = BackwardAllPairs::new(&g, config).unwrap();
    base.preprocess(&mut seq_store).unwrap();
    let report = base.preprocess_parallel(&mut par_store).unwrap();
    assert_eq!(report.records_written, 30);

    let ns = base.namespace();
    for id in 0..30 {
        assert_eq!(seq_store.read(&ns, id).unwrap(), par_store.read(&ns, id).unwrap());
    }
}
