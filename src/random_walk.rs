//! Random walks with restart.
//!
//! A walk stops at the current node with probability `alpha` per step, otherwise moves
//! to a uniformly random out-neighbor. A dead end does not stop the walk: it moves to
//! the `restart` node, so the terminal distribution is the PPR of `restart`'s chain.

use crate::graph::{Direction, GraphView};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn step<G: GraphView, R: Rng + ?Sized>(graph: &G, cur: usize, restart: usize, rng: &mut R) -> usize {
    let nbrs = graph.neighbors(cur, Direction::Out);
    if nbrs.is_empty() {
        restart
    } else {
        nbrs[rng.random_range(0..nbrs.len())]
    }
}

/// Walk from `start` and return the node it stops at.
pub fn walk<G: GraphView, R: Rng + ?Sized>(graph: &G, start: usize, restart: usize, alpha: f64, rng: &mut R) -> usize {
    if start == restart && graph.out_degree(start) == 0 {
        // Every step either stops at `start` or teleports back to it.
        return start;
    }
    let mut cur = start;
    loop {
        if rng.random::<f64>() < alpha {
            return cur;
        }
        cur = step(graph, cur, restart, rng);
    }
}

/// Like [`walk`], but always takes one hop before the first stopping check.
///
/// FORA uses this for residue whose `α` share was already settled by push.
pub fn walk_skip_first_stop<G: GraphView, R: Rng + ?Sized>(
    graph: &G,
    start: usize,
    restart: usize,
    alpha: f64,
    rng: &mut R,
) -> usize {
    let mut cur = step(graph, start, restart, rng);
    loop {
        if rng.random::<f64>() < alpha {
            return cur;
        }
        cur = step(graph, cur, restart, rng);
    }
}

/// A walk sampler owning its seeded RNG.
#[derive(Debug, Clone)]
pub struct RandomWalkSampler {
    alpha: f64,
    rng: ChaCha8Rng,
}

impl RandomWalkSampler {
    pub fn new(alpha: f64, seed: u64) -> Self {
        Self { alpha, rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn walk<G: GraphView>(&mut self, graph: &G, start: usize, restart: usize) -> usize {
        walk(graph, start, restart, self.alpha, &mut self.rng)
    }

    pub fn walk_skip_first_stop<G: GraphView>(&mut self, graph: &G, start: usize, restart: usize) -> usize {
        walk_skip_first_stop(graph, start, restart, self.alpha, &mut self.rng)
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}
