//! Read-only directed graph views.
//!
//! Estimators only ever see a graph through [`GraphView`]: dense internal indices
//! `0..n`, borrowed neighbor slices in both directions, and a stable mapping to the
//! caller's external [`NodeId`]s.

use crate::{Error, Result};
use std::collections::{BTreeSet, HashMap};

/// External, opaque node identifier.
pub type NodeId = u64;

/// Edge direction relative to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Out,
    In,
}

/// A read-only graph view that returns **borrowed** neighbor slices.
///
/// Borrowed slices keep random walks and push loops allocation-free. Implementations
/// must be safe for concurrent reads if used from parallel preprocessing.
pub trait GraphView {
    fn node_count(&self) -> usize;
    fn edge_count(&self) -> usize;

    /// Neighbors of `node` along `dir` (out-neighbors or in-neighbors).
    fn neighbors(&self, node: usize, dir: Direction) -> &[usize];

    fn degree(&self, node: usize, dir: Direction) -> usize {
        self.neighbors(node, dir).len()
    }

    fn neighbor_at(&self, node: usize, dir: Direction, index: usize) -> usize {
        self.neighbors(node, dir)[index]
    }

    fn out_degree(&self, node: usize) -> usize {
        self.degree(node, Direction::Out)
    }

    fn to_internal(&self, id: NodeId) -> Option<usize>;
    fn to_external(&self, index: usize) -> NodeId;

    /// Resolve an external id, failing on ids the view does not know.
    fn resolve(&self, id: NodeId) -> Result<usize> {
        self.to_internal(id).ok_or(Error::UnknownNode(id))
    }

    fn nodes(&self) -> std::ops::Range<usize> {
        0..self.node_count()
    }
}

/// Compressed sparse row graph holding both out- and in-adjacency.
///
/// Internal indices follow ascending external id order. Parallel edges are kept
/// (they count towards degree), matching a multigraph backing store.
#[derive(Debug, Clone, Default)]
pub struct CsrGraph {
    ids: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    out_offsets: Vec<usize>,
    out_targets: Vec<usize>,
    in_offsets: Vec<usize>,
    in_sources: Vec<usize>,
}

impl CsrGraph {
    /// Build from an edge list; the node set is every id appearing on an edge.
    pub fn from_edges(edges: &[(NodeId, NodeId)]) -> Self {
        let ids: BTreeSet<NodeId> = edges.iter().flat_map(|&(u, v)| [u, v]).collect();
        Self::build(ids.into_iter().collect(), edges)
    }

    /// Build from an explicit node set (isolated nodes allowed) and an edge list.
    pub fn with_nodes(nodes: &[NodeId], edges: &[(NodeId, NodeId)]) -> Result<Self> {
        let ids: BTreeSet<NodeId> = nodes.iter().copied().collect();
        for &(u, v) in edges {
            for id in [u, v] {
                if !ids.contains(&id) {
                    return Err(Error::UnknownNode(id));
                }
            }
        }
        Ok(Self::build(ids.into_iter().collect(), edges))
    }

    fn build(ids: Vec<NodeId>, edges: &[(NodeId, NodeId)]) -> Self {
        let n = ids.len();
        let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let pairs: Vec<(usize, usize)> = edges.iter().map(|(u, v)| (index[u], index[v])).collect();
        let (out_offsets, out_targets) = csr(n, pairs.iter().copied());
        let (in_offsets, in_sources) = csr(n, pairs.iter().map(|&(u, v)| (v, u)));

        Self { ids, index, out_offsets, out_targets, in_offsets, in_sources }
    }

    #[cfg(feature = "petgraph")]
    pub fn from_petgraph<N, E, Ix>(graph: &petgraph::Graph<N, E, petgraph::Directed, Ix>) -> Self
    where
        Ix: petgraph::graph::IndexType,
    {
        use petgraph::visit::EdgeRef;
        let ids: Vec<NodeId> = graph.node_indices().map(|i| i.index() as NodeId).collect();
        let edges: Vec<(NodeId, NodeId)> = graph
            .edge_references()
            .map(|e| (e.source().index() as NodeId, e.target().index() as NodeId))
            .collect();
        Self::build(ids, &edges)
    }
}

fn csr(n: usize, pairs: impl Iterator<Item = (usize, usize)> + Clone) -> (Vec<usize>, Vec<usize>) {
    let mut offsets = vec![0usize; n + 1];
    for (u, _) in pairs.clone() {
        offsets[u + 1] += 1;
    }
    for i in 0..n {
        offsets[i + 1] += offsets[i];
    }
    let mut cursor = offsets.clone();
    let mut adj = vec![0usize; offsets[n]];
    for (u, v) in pairs {
        adj[cursor[u]] = v;
        cursor[u] += 1;
    }
    (offsets, adj)
}

impl GraphView for CsrGraph {
    fn node_count(&self) -> usize {
        self.ids.len()
    }

    fn edge_count(&self) -> usize {
        self.out_targets.len()
    }

    fn neighbors(&self, node: usize, dir: Direction) -> &[usize] {
        let (offsets, adj) = match dir {
            Direction::Out => (&self.out_offsets, &self.out_targets),
            Direction::In => (&self.in_offsets, &self.in_sources),
        };
        match (offsets.get(node), offsets.get(node + 1)) {
            (Some(&lo), Some(&hi)) => &adj[lo..hi],
            _ => &[],
        }
    }

    fn to_internal(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    fn to_external(&self, index: usize) -> NodeId {
        self.ids[index]
    }
}
