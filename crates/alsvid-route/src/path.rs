//! Paths, split paths and swap operations.
//!
//! A path through the topology is split into two contiguous halves around
//! its midpoint. Each half walks its endpoint qubit inward toward the split
//! boundary, so the two halves can swap simultaneously: a path of `k` edges
//! costs `k - 1` swaps but only about `k / 2` time steps.
//!
//! Given the path `[0, 1, 2, 3]`, the balanced split is `[0, 1] / [2, 3]`,
//! where node 1 or node 2 may anchor an intersection with another path.
//! Given `[0, 1, 2, 3, 4]`, the balanced split is `[0, 1] / [2, 3, 4]`, and
//! shifting may later produce `[0, 1, 2] / [3, 4]` while resolving
//! conflicts.

use serde::{Deserialize, Serialize};
use std::fmt;

use alsvid_graph::Topology;

use crate::error::{RouteError, RouteResult};
use crate::mapping::QubitId;

/// A swap of the logical qubits held at two adjacent physical nodes.
///
/// The pair is unordered; [`Swap::new`] normalizes the endpoints so equal
/// swaps compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Swap(pub u32, pub u32);

impl Swap {
    /// Create a swap with normalized endpoint order.
    pub fn new(a: u32, b: u32) -> Self {
        Swap(a.min(b), a.max(b))
    }

    /// Check whether the swap touches a node.
    #[inline]
    pub fn touches(&self, node: u32) -> bool {
        self.0 == node || self.1 == node
    }

    /// Check whether two swaps share a node.
    #[inline]
    pub fn overlaps(&self, other: &Swap) -> bool {
        self.touches(other.0) || self.touches(other.1)
    }
}

impl fmt::Display for Swap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}<->{})", self.0, self.1)
    }
}

/// A set of swaps that may execute in the same time step.
///
/// Invariant: no physical node appears in more than one swap of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapGroup(pub Vec<Swap>);

impl SwapGroup {
    /// Number of swaps in the group.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the group is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the swaps.
    pub fn iter(&self) -> impl Iterator<Item = &Swap> {
        self.0.iter()
    }
}

impl fmt::Display for SwapGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, swap) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{swap}")?;
        }
        write!(f, "}}")
    }
}

/// Normalized unordered pair of physical nodes, used as a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey(pub u32, pub u32);

impl PairKey {
    /// Create a key with normalized order.
    pub fn new(a: u32, b: u32) -> Self {
        PairKey(a.min(b), a.max(b))
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.0, self.1)
    }
}

/// Normalized unordered pair of logical qubits: one two-qubit interaction
/// requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InteractionKey {
    pub a: QubitId,
    pub b: QubitId,
}

impl InteractionKey {
    /// Create a key with normalized order.
    pub fn new(a: QubitId, b: QubitId) -> Self {
        if a.0 <= b.0 {
            InteractionKey { a, b }
        } else {
            InteractionKey { a: b, b: a }
        }
    }
}

impl fmt::Display for InteractionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.a, self.b)
    }
}

/// A simple path through the topology, held as its two halves.
///
/// Invariants: both halves are non-empty, consecutive nodes are coupled in
/// the topology, and no node repeats. The boundary nodes (`head` last,
/// `tail` first) are where the two endpoint qubits end up, adjacent across
/// the split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPath {
    head: Vec<u32>,
    tail: Vec<u32>,
}

impl SplitPath {
    /// Split a path at its node-count midpoint.
    ///
    /// For a path of `k` edges (`k + 1` nodes) this yields the balanced
    /// split index `ceil(k / 2)`. Paths shorter than two nodes cannot be
    /// split.
    pub fn from_path(path: &[u32]) -> RouteResult<Self> {
        if path.len() < 2 {
            return Err(RouteError::InvalidSplit {
                path_id: 0,
                detail: format!("path with {} node(s) cannot be split", path.len()),
            });
        }
        let mid = path.len() >> 1;
        Ok(SplitPath {
            head: path[..mid].to_vec(),
            tail: path[mid..].to_vec(),
        })
    }

    /// First half of the path.
    pub fn head(&self) -> &[u32] {
        &self.head
    }

    /// Second half of the path.
    pub fn tail(&self) -> &[u32] {
        &self.tail
    }

    /// First node of the path (one interaction endpoint).
    #[inline]
    pub fn start(&self) -> u32 {
        self.head[0]
    }

    /// Last node of the path (the other interaction endpoint).
    #[inline]
    pub fn end(&self) -> u32 {
        self.tail[self.tail.len() - 1]
    }

    /// The two nodes around the split boundary: last node of the head and
    /// first node of the tail.
    #[inline]
    pub fn boundary(&self) -> (u32, u32) {
        (self.head[self.head.len() - 1], self.tail[0])
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    /// A split path always holds at least two nodes.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check whether the path visits a node.
    pub fn contains(&self, node: u32) -> bool {
        self.head.contains(&node) || self.tail.contains(&node)
    }

    /// Iterate over all nodes, head then tail.
    pub fn nodes(&self) -> impl Iterator<Item = u32> + '_ {
        self.head.iter().chain(self.tail.iter()).copied()
    }

    /// Rejoin the halves into a single node sequence.
    pub fn join(&self) -> Vec<u32> {
        self.nodes().collect()
    }

    /// The swap chains of the two halves.
    ///
    /// The head chain walks the start qubit inward: `(n0,n1), (n1,n2), ...`
    /// up to the boundary. The tail chain walks the end qubit inward from
    /// the other side. Applying both chains leaves the two endpoint qubits
    /// on the boundary nodes, adjacent across the split. Swaps within one
    /// chain are ordered; the two chains are independent.
    pub fn swap_chains(&self) -> (Vec<Swap>, Vec<Swap>) {
        let head_chain = self
            .head
            .windows(2)
            .map(|w| Swap::new(w[0], w[1]))
            .collect();
        let tail_chain = (1..self.tail.len())
            .rev()
            .map(|i| Swap::new(self.tail[i], self.tail[i - 1]))
            .collect();
        (head_chain, tail_chain)
    }

    /// Validate the split against the topology.
    ///
    /// Checks that both halves are non-empty, consecutive nodes (including
    /// across the boundary) are coupled, and no node repeats. Returns a
    /// human-readable description of the first violation.
    pub fn validate(&self, topology: &Topology) -> Result<(), String> {
        if self.head.is_empty() || self.tail.is_empty() {
            return Err("a split half is empty".into());
        }
        let nodes = self.join();
        for window in nodes.windows(2) {
            if !topology.has_edge(window[0], window[1]) {
                return Err(format!(
                    "nodes {} and {} are consecutive but not coupled",
                    window[0], window[1]
                ));
            }
        }
        let mut seen = std::collections::BTreeSet::new();
        for node in &nodes {
            if !seen.insert(node) {
                return Err(format!("node {node} appears more than once"));
            }
        }
        Ok(())
    }

    /// Move the first node of the tail onto the head.
    pub(crate) fn grow_head(&mut self) {
        self.head.push(self.tail.remove(0));
    }

    /// Move the last node of the head onto the tail.
    pub(crate) fn grow_tail(&mut self) {
        if let Some(node) = self.head.pop() {
            self.tail.insert(0, node);
        }
    }
}

impl fmt::Display for SplitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} / {:?}", self.head, self.tail)
    }
}
