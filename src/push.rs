//! Local push propagation.
//!
//! A push at node `v` settles `α·r(v)` into the reserve and spreads the remaining
//! `(1-α)·r(v)` over `v`'s neighbors' residues. Repeating until no node clears the
//! threshold gives a reserve that under-estimates PPR by at most the leftover residue.
//!
//! - **Forward** (from a source, over out-edges): the share of `v` is divided by
//!   `outdeg(v)`; a node is active while `r(u) / outdeg(u) >= rmax`.
//! - **Backward** (towards a target, over in-edges): the share pushed into in-neighbor
//!   `u` is divided by `outdeg(u)` (not `indeg(v)`); a node is active while `r(u) > rmax`.

use crate::graph::{Direction, GraphView};
use crate::topk::SparseVector;
use std::collections::{HashSet, VecDeque};

/// Result of one push run.
#[derive(Debug, Clone, Default)]
pub struct PushOutcome {
    pub reserve: SparseVector,
    pub residue: SparseVector,
    /// Σ residue after the run.
    pub rsum: f64,
    /// Number of neighbor residue updates, the push's cost in edge operations.
    pub edge_pushes: usize,
}

/// FIFO of active nodes with a membership set.
///
/// Membership only holds at enqueue time: a node's residue can be consumed (or the
/// threshold can change) before it is dequeued, so callers recheck on pop.
#[derive(Debug, Clone, Default)]
struct Frontier {
    queue: VecDeque<usize>,
    queued: HashSet<usize>,
}

impl Frontier {
    fn push(&mut self, node: usize) {
        if self.queued.insert(node) {
            self.queue.push_back(node);
        }
    }

    fn pop(&mut self) -> Option<usize> {
        let node = self.queue.pop_front()?;
        self.queued.remove(&node);
        Some(node)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn clear(&mut self) {
        self.queue.clear();
        self.queued.clear();
    }
}

pub(crate) fn add(map: &mut SparseVector, node: usize, amount: f64) -> f64 {
    let slot = map.entry(node).or_insert(0.0);
    *slot += amount;
    *slot
}

/// Residue per out-degree; a dangling node with positive residue is always active.
fn per_degree(residue: f64, degree: usize) -> f64 {
    if degree == 0 {
        if residue > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        residue / degree as f64
    }
}

/// Run a push from `node` in the given direction until the frontier empties.
pub fn push<G: GraphView>(graph: &G, node: usize, direction: Direction, alpha: f64, threshold: f64) -> PushOutcome {
    match direction {
        Direction::Out => forward_push(graph, node, alpha, threshold),
        Direction::In => backward_push(graph, node, alpha, threshold),
    }
}

/// Forward push from `source`.
///
/// Mass from a dangling node is redirected to `source`, so `Σ reserve + Σ residue = 1`
/// holds exactly (up to float rounding). A dangling source settles everything at once.
pub fn forward_push<G: GraphView>(graph: &G, source: usize, alpha: f64, rmax: f64) -> PushOutcome {
    let mut out = PushOutcome::default();
    let source_degree = graph.out_degree(source);
    if source_degree == 0 {
        out.reserve.insert(source, 1.0);
        return out;
    }

    let mut frontier = Frontier::default();
    out.residue.insert(source, 1.0);
    frontier.push(source);

    while let Some(v) = frontier.pop() {
        let r = out.residue.remove(&v).unwrap_or(0.0);
        if r <= 0.0 {
            continue;
        }
        add(&mut out.reserve, v, alpha * r);
        let remaining = (1.0 - alpha) * r;

        let degree = graph.out_degree(v);
        if degree == 0 {
            let rs = add(&mut out.residue, source, remaining);
            out.edge_pushes += 1;
            if per_degree(rs, source_degree) >= rmax {
                frontier.push(source);
            }
            continue;
        }

        let share = remaining / degree as f64;
        for &u in graph.neighbors(v, Direction::Out) {
            let ru = add(&mut out.residue, u, share);
            out.edge_pushes += 1;
            if per_degree(ru, graph.out_degree(u)) >= rmax {
                frontier.push(u);
            }
        }
    }

    out.rsum = out.residue.values().sum();
    out
}

/// Backward push towards `target`.
///
/// `reserve[v]` estimates `π(v, target)`. A target nobody links to settles everything
/// at once.
pub fn backward_push<G: GraphView>(graph: &G, target: usize, alpha: f64, rmax: f64) -> PushOutcome {
    let mut out = PushOutcome::default();
    if graph.degree(target, Direction::In) == 0 {
        out.reserve.insert(target, 1.0);
        return out;
    }

    let mut frontier = Frontier::default();
    out.residue.insert(target, 1.0);
    frontier.push(target);

    while let Some(v) = frontier.pop() {
        let r = out.residue.remove(&v).unwrap_or(0.0);
        if r <= 0.0 {
            continue;
        }
        add(&mut out.reserve, v, alpha * r);
        let remaining = (1.0 - alpha) * r;

        for &u in graph.neighbors(v, Direction::In) {
            // u -> v exists, so outdeg(u) >= 1.
            let ru = add(&mut out.residue, u, remaining / graph.out_degree(u) as f64);
            out.edge_pushes += 1;
            if ru > rmax {
                frontier.push(u);
            }
        }
    }

    out.rsum = out.residue.values().sum();
    out
}

/// Forward-push state carried across the refinement rounds of one top-k query.
///
/// Between rounds only the frontier of deferred nodes is kept; it is not rebuilt from
/// the residue map, so every carried node is rechecked against the current threshold.
#[derive(Debug, Clone, Default)]
pub struct PushState {
    pub reserve: SparseVector,
    pub residue: SparseVector,
    /// Σ residue after the latest round.
    pub rsum: f64,
    pub edge_pushes: usize,
    frontier: Frontier,
    started: bool,
}

impl PushState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes carried into the next round.
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn frontier_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.frontier.queue.iter().copied()
    }
}

/// One refinement round of forward push for top-k queries.
///
/// The first call seeds `residue[source] = 1`. Each dequeued node is pushed only if it
/// still clears `rmax`; otherwise, and for every neighbor touched, the node is either
/// re-enqueued now (`>= rmax`), deferred to the next round (`>= min_rmax`) or dropped.
pub fn forward_push_topk<G: GraphView>(
    graph: &G,
    source: usize,
    alpha: f64,
    rmax: f64,
    min_rmax: f64,
    state: &mut PushState,
) {
    let source_degree = graph.out_degree(source);
    if source_degree == 0 {
        state.reserve.clear();
        state.residue.clear();
        state.reserve.insert(source, 1.0);
        state.frontier.clear();
        state.rsum = 0.0;
        state.started = true;
        return;
    }

    if !state.started {
        state.residue.insert(source, 1.0);
        state.frontier.push(source);
        state.started = true;
    }

    let mut queue = std::mem::take(&mut state.frontier);
    let mut next = Frontier::default();

    while let Some(v) = queue.pop() {
        let r = state.residue.get(&v).copied().unwrap_or(0.0);
        let degree = graph.out_degree(v);
        let ratio = per_degree(r, degree);

        if ratio < rmax {
            if ratio >= min_rmax {
                next.push(v);
            }
            continue;
        }

        state.residue.remove(&v);
        add(&mut state.reserve, v, alpha * r);
        let remaining = (1.0 - alpha) * r;

        if degree == 0 {
            let rs = add(&mut state.residue, source, remaining);
            state.edge_pushes += 1;
            classify(source, per_degree(rs, source_degree), rmax, min_rmax, &mut queue, &mut next);
            continue;
        }

        let share = remaining / degree as f64;
        for &u in graph.neighbors(v, Direction::Out) {
            let ru = add(&mut state.residue, u, share);
            state.edge_pushes += 1;
            classify(u, per_degree(ru, graph.out_degree(u)), rmax, min_rmax, &mut queue, &mut next);
        }
    }

    state.frontier = next;
    state.rsum = state.residue.values().sum();
}

fn classify(node: usize, ratio: f64, rmax: f64, min_rmax: f64, queue: &mut Frontier, next: &mut Frontier) {
    if ratio >= rmax {
        queue.push(node);
    } else if ratio >= min_rmax {
        next.push(node);
    }
}
