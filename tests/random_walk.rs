use fora::{walk, walk_skip_first_stop, Direction, GraphView, NodeId, RandomWalkSampler};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Identity-mapped adjacency lists; exercises the trait boundary with a non-CSR view.
#[derive(Debug, Clone)]
struct AdjListGraph {
    out: Vec<Vec<usize>>,
    inn: Vec<Vec<usize>>,
}

impl AdjListGraph {
    fn new(mut out: Vec<Vec<usize>>) -> Self {
        let mut inn = vec![Vec::new(); out.len()];
        for (u, nbrs) in out.iter_mut().enumerate() {
            nbrs.sort_unstable();
            for &v in nbrs.iter() {
                inn[v].push(u);
            }
        }
        Self { out, inn }
    }

    fn chain(len: usize) -> Self {
        Self::new((0..len).map(|i| if i + 1 < len { vec![i + 1] } else { Vec::new() }).collect())
    }
}

impl GraphView for AdjListGraph {
    fn node_count(&self) -> usize {
        self.out.len()
    }

    fn edge_count(&self) -> usize {
        self.out.iter().map(Vec::len).sum()
    }

    fn neighbors(&self, node: usize, dir: Direction) -> &[usize] {
        let lists = match dir {
            Direction::Out => &self.out,
            Direction::In => &self.inn,
        };
        lists.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    fn to_internal(&self, id: NodeId) -> Option<usize> {
        let i = id as usize;
        (i < self.out.len()).then_some(i)
    }

    fn to_external(&self, index: usize) -> NodeId {
        index as NodeId
    }
}

#[test]
fn chain_stopping_time_is_geometric() {
    // On a long chain the walk stops at hop i with probability α(1-α)^i.
    let alpha = 0.3;
    let g = AdjListGraph::chain(60);
    let mut sampler = RandomWalkSampler::new(alpha, 2024);
    let trials = 20_000;
    let mut hits = vec![0usize; g.node_count()];
    for _ in 0..trials {
        hits[sampler.walk(&g, 0, 0)] += 1;
    }
    for (i, &h) in hits.iter().enumerate().take(8) {
        let expected = alpha * (1.0 - alpha).powi(i as i32);
        let observed = h as f64 / trials as f64;
        // ~4.5 standard deviations at the largest bucket.
        assert!((observed - expected).abs() < 0.015, "hop {i}: observed {observed}, expected {expected}");
    }
}

#[test]
fn skip_first_stop_shifts_the_distribution_by_one_hop() {
    let alpha = 0.3;
    let g = AdjListGraph::chain(60);
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let trials = 20_000;
    let mut hits = vec![0usize; g.node_count()];
    for _ in 0..trials {
        hits[walk_skip_first_stop(&g, 0, 0, alpha, &mut rng)] += 1;
    }
    assert_eq!(hits[0], 0);
    for i in 1..8 {
        let expected = alpha * (1.0 - alpha).powi(i as i32 - 1);
        let observed = hits[i] as f64 / trials as f64;
        assert!((observed - expected).abs() < 0.015, "hop {i}: observed {observed}, expected {expected}");
    }
}

#[test]
fn reproducible_given_seed() {
    let g = AdjListGraph::new(vec![vec![1, 2], vec![2], vec![0, 3], vec![]]);
    let run = |seed| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..200).map(|_| walk(&g, 0, 0, 0.15, &mut rng)).collect::<Vec<_>>()
    };
    assert_eq!(run(7), run(7));
    assert_ne!(run(7), run(8));
}

proptest! {
    // Property: walks end on a node reachable from the start (or the restart node).
    #[test]
    fn prop_walks_end_on_reachable_nodes(
        n in 1usize..8,
        adj in prop::collection::vec(prop::collection::vec(0usize..8, 0..4), 1..8),
        seed in any::<u64>(),
    ) {
        let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, nbrs) in adj.into_iter().take(n).enumerate() {
            out[i] = nbrs.into_iter().map(|x| x % n).collect();
        }
        let g = AdjListGraph::new(out);

        // Reachability from 0 over out-edges.
        let mut reach = vec![false; n];
        let mut stack = vec![0usize];
        reach[0] = true;
        while let Some(v) = stack.pop() {
            for &u in g.neighbors(v, Direction::Out) {
                if !reach[u] {
                    reach[u] = true;
                    stack.push(u);
                }
            }
        }

        let mut sampler = RandomWalkSampler::new(0.2, seed);
        for _ in 0..50 {
            let end = sampler.walk(&g, 0, 0);
            prop_assert!(end < n);
            prop_assert!(reach[end]);
        }
    }
}
