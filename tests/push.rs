use fora::ppr::power_iteration;
use fora::{backward_push, forward_push, forward_push_topk, CsrGraph, GraphView, NodeId, PushState};
use proptest::prelude::*;

fn arb_graph() -> impl Strategy<Value = CsrGraph> {
    (1u64..12, prop::collection::vec((0u64..12, 0u64..12), 0..40)).prop_map(|(n, edges)| {
        let nodes: Vec<NodeId> = (0..n).collect();
        let edges: Vec<(NodeId, NodeId)> = edges.into_iter().map(|(u, v)| (u % n, v % n)).collect();
        CsrGraph::with_nodes(&nodes, &edges).expect("edges are clamped into the node set")
    })
}

/// Every node gets a ring edge, so nothing is dangling and every node has an in-edge.
fn arb_ring_graph() -> impl Strategy<Value = CsrGraph> {
    (2u64..10, prop::collection::vec((0u64..10, 0u64..10), 0..30)).prop_map(|(n, extra)| {
        let mut edges: Vec<(NodeId, NodeId)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        edges.extend(extra.into_iter().map(|(u, v)| (u % n, v % n)));
        CsrGraph::from_edges(&edges)
    })
}

fn total(map: &fora::SparseVector) -> f64 {
    map.values().sum()
}

proptest! {
    // Property: an untruncated forward push never creates or loses mass.
    #[test]
    fn prop_forward_push_conserves_mass(
        g in arb_graph(),
        alpha in 0.1f64..0.9,
        rmax in 1e-5f64..0.5,
    ) {
        for s in g.nodes() {
            let out = forward_push(&g, s, alpha, rmax);
            let mass = total(&out.reserve) + total(&out.residue);
            prop_assert!((mass - 1.0).abs() < 1e-9, "source {s}: mass {mass}");
            prop_assert!((out.rsum - total(&out.residue)).abs() < 1e-12);
            for (&v, &r) in &out.residue {
                prop_assert!(r >= 0.0);
                // Nothing left on the frontier: every residue is under the threshold.
                let d = g.out_degree(v);
                prop_assert!(d > 0 && r / d as f64 <= rmax || r == 0.0, "node {v}: r={r} d={d}");
            }
        }
    }

    // Property: the top-k push keeps mass across any sequence of shrinking thresholds.
    #[test]
    fn prop_topk_push_conserves_mass_across_rounds(
        g in arb_graph(),
        rounds in prop::collection::vec(1e-5f64..0.5, 1..5),
    ) {
        let mut thresholds = rounds;
        thresholds.sort_by(|a, b| b.total_cmp(a));
        let mut state = PushState::new();
        let mut settled = 0.0;
        for rmax in thresholds {
            forward_push_topk(&g, 0, 0.15, rmax, 1e-6, &mut state);
            let reserve = total(&state.reserve);
            prop_assert!((reserve + state.rsum - 1.0).abs() < 1e-9);
            prop_assert!(reserve + 1e-12 >= settled);
            settled = reserve;
        }
    }

    // Property: backward push reserves stay within the threshold of the true PPR.
    #[test]
    fn prop_backward_push_error_is_bounded(g in arb_ring_graph(), target in 0usize..10) {
        let t = target % g.node_count();
        let alpha = 0.2;
        let rmax = 1e-4;
        let out = backward_push(&g, t, alpha, rmax);
        for s in g.nodes() {
            let truth = power_iteration(&g, s, alpha, 400)[t];
            let est = out.reserve.get(&s).copied().unwrap_or(0.0);
            prop_assert!(est <= truth + 1e-9, "s={s}: est {est} > truth {truth}");
            prop_assert!(truth - est <= rmax + 1e-9, "s={s}: gap {}", truth - est);
        }
    }
}

#[test]
fn zero_out_degree_source_is_certain() {
    let g = CsrGraph::with_nodes(&[1, 2, 3], &[(2, 3)]).unwrap();
    let s = g.resolve(1).unwrap();
    let out = forward_push(&g, s, 0.15, 1e-4);
    assert_eq!(out.reserve.get(&s), Some(&1.0));
    assert_eq!(out.reserve.len(), 1);
    assert_eq!(out.rsum, 0.0);
}
