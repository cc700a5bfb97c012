//! Immutable coupling topology with deterministic path queries.

use std::collections::VecDeque;

use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

/// Static connectivity graph of a quantum device.
///
/// Nodes are physical qubit sites `0..num_nodes`, edges are the pairs that
/// can host a two-qubit gate. The graph is undirected and immutable: no
/// mutation API is exposed after construction, so a `Topology` can be shared
/// freely between routing rounds.
///
/// ## Determinism
///
/// Adjacency lists are kept sorted ascending. [`shortest_path`] returns the
/// lexicographically smallest node sequence among all shortest paths, and
/// [`all_shortest_paths`] enumerates every shortest path in lexicographic
/// order. Identical queries always produce identical answers.
///
/// ## Deserialization
///
/// Only the edge list and node count are serialized. After deserialization,
/// call [`rebuild_caches`](Self::rebuild_caches) to recompute the adjacency
/// lists and component labels; queries on a non-rebuilt topology treat the
/// graph as edgeless.
///
/// [`shortest_path`]: Self::shortest_path
/// [`all_shortest_paths`]: Self::all_shortest_paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    /// List of coupled node pairs (bidirectional), normalized `(min, max)`.
    edges: Vec<(u32, u32)>,
    /// Number of physical nodes.
    num_nodes: u32,
    /// Adjacency lists, sorted ascending for deterministic iteration.
    #[serde(skip)]
    adjacency: Vec<Vec<u32>>,
    /// Connected-component label per node.
    #[serde(skip)]
    component: Vec<u32>,
}

impl Topology {
    /// Build a topology from an edge list over nodes `0..num_nodes`.
    ///
    /// Self-loops and duplicate edges (in either orientation) are ignored.
    /// An edge referencing a node outside `0..num_nodes` is rejected with
    /// [`GraphError::EdgeOutOfRange`].
    pub fn from_edges(
        num_nodes: u32,
        edges: impl IntoIterator<Item = (u32, u32)>,
    ) -> GraphResult<Self> {
        let mut normalized: Vec<(u32, u32)> = Vec::new();
        for (a, b) in edges {
            if a >= num_nodes || b >= num_nodes {
                return Err(GraphError::EdgeOutOfRange { a, b, num_nodes });
            }
            if a == b {
                continue;
            }
            let edge = (a.min(b), a.max(b));
            if !normalized.contains(&edge) {
                normalized.push(edge);
            }
        }

        let mut topology = Self {
            edges: normalized,
            num_nodes,
            adjacency: vec![],
            component: vec![],
        };
        topology.rebuild_caches();
        Ok(topology)
    }

    /// Rebuild the adjacency lists and component labels from the edge list.
    ///
    /// Must be called after deserialization; `from_edges` and the factory
    /// constructors call it automatically.
    pub fn rebuild_caches(&mut self) {
        let n = self.num_nodes as usize;
        self.adjacency = vec![vec![]; n];
        for &(a, b) in &self.edges {
            self.adjacency[a as usize].push(b);
            self.adjacency[b as usize].push(a);
        }
        for list in &mut self.adjacency {
            list.sort_unstable();
        }

        let mut union_find = UnionFind::<u32>::new(n);
        for &(a, b) in &self.edges {
            union_find.union(a, b);
        }
        self.component = union_find.into_labeling();
    }

    /// Number of physical nodes.
    #[inline]
    pub fn num_nodes(&self) -> u32 {
        self.num_nodes
    }

    /// Number of coupling edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// The coupling edges, normalized `(min, max)`.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Check whether two nodes are directly coupled.
    #[inline]
    pub fn has_edge(&self, a: u32, b: u32) -> bool {
        self.adjacency
            .get(a as usize)
            .is_some_and(|list| list.binary_search(&b).is_ok())
    }

    /// Neighbors of a node, in ascending order.
    ///
    /// An out-of-range node yields an empty iterator.
    pub fn neighbors(&self, node: u32) -> impl Iterator<Item = u32> + '_ {
        self.adjacency
            .get(node as usize)
            .map(|list| list.iter().copied())
            .into_iter()
            .flatten()
    }

    /// Check whether two nodes lie in the same connected component.
    pub fn same_component(&self, a: u32, b: u32) -> bool {
        let (a, b) = (a as usize, b as usize);
        a < self.component.len() && b < self.component.len() && self.component[a] == self.component[b]
    }

    fn check_node(&self, node: u32) -> GraphResult<()> {
        if node < self.num_nodes {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(node))
        }
    }

    fn check_connected(&self, a: u32, b: u32) -> GraphResult<()> {
        self.check_node(a)?;
        self.check_node(b)?;
        if self.same_component(a, b) {
            Ok(())
        } else {
            Err(GraphError::Disconnected { a, b })
        }
    }

    /// BFS distances from `source` to every node, `u32::MAX` if unreachable.
    fn bfs_distances(&self, source: u32) -> Vec<u32> {
        let mut dist = vec![u32::MAX; self.num_nodes as usize];
        dist[source as usize] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(source);
        while let Some(current) = queue.pop_front() {
            let d = dist[current as usize];
            for &neighbor in &self.adjacency[current as usize] {
                if dist[neighbor as usize] == u32::MAX {
                    dist[neighbor as usize] = d + 1;
                    queue.push_back(neighbor);
                }
            }
        }
        dist
    }

    /// Shortest-path distance between two nodes.
    ///
    /// Fails with [`GraphError::Disconnected`] if the nodes lie in different
    /// components.
    pub fn distance(&self, a: u32, b: u32) -> GraphResult<u32> {
        self.check_connected(a, b)?;
        if a == b {
            return Ok(0);
        }
        Ok(self.bfs_distances(b)[a as usize])
    }

    /// The lexicographically smallest shortest path from `a` to `b`,
    /// inclusive of both endpoints.
    ///
    /// Fails with [`GraphError::Disconnected`] if the nodes lie in different
    /// components.
    pub fn shortest_path(&self, a: u32, b: u32) -> GraphResult<Vec<u32>> {
        self.check_connected(a, b)?;
        if a == b {
            return Ok(vec![a]);
        }

        // Walk forward from `a`, always taking the smallest neighbor that
        // still decreases the distance to `b`. Sorted adjacency makes the
        // first match the lexicographic minimum.
        let dist_to_b = self.bfs_distances(b);
        let mut path = vec![a];
        let mut current = a;
        while current != b {
            let remaining = dist_to_b[current as usize];
            let next = self.adjacency[current as usize]
                .iter()
                .copied()
                .find(|&n| dist_to_b[n as usize] + 1 == remaining)
                .ok_or(GraphError::Disconnected { a, b })?;
            path.push(next);
            current = next;
        }
        Ok(path)
    }

    /// Every shortest path from `a` to `b`, in lexicographic order.
    ///
    /// The first entry equals [`shortest_path`](Self::shortest_path). Fails
    /// with [`GraphError::Disconnected`] if the nodes lie in different
    /// components.
    pub fn all_shortest_paths(&self, a: u32, b: u32) -> GraphResult<Vec<Vec<u32>>> {
        self.check_connected(a, b)?;
        if a == b {
            return Ok(vec![vec![a]]);
        }

        let dist_to_b = self.bfs_distances(b);
        let mut paths = Vec::new();
        let mut prefix = vec![a];
        self.collect_shortest(b, &dist_to_b, &mut prefix, &mut paths);
        Ok(paths)
    }

    fn collect_shortest(
        &self,
        target: u32,
        dist_to_target: &[u32],
        prefix: &mut Vec<u32>,
        out: &mut Vec<Vec<u32>>,
    ) {
        let current = prefix[prefix.len() - 1];
        if current == target {
            out.push(prefix.clone());
            return;
        }
        let remaining = dist_to_target[current as usize];
        for &next in &self.adjacency[current as usize] {
            if dist_to_target[next as usize] + 1 == remaining {
                prefix.push(next);
                self.collect_shortest(target, dist_to_target, prefix, out);
                prefix.pop();
            }
        }
    }

    /// Linear chain topology `0-1-2-...-(n-1)`.
    pub fn linear(n: u32) -> Self {
        let edges = (0..n.saturating_sub(1)).map(|i| (i, i + 1));
        Self::from_edges(n, edges).expect("linear edges are in range")
    }

    /// Ring topology `0-1-...-(n-1)-0`.
    pub fn ring(n: u32) -> Self {
        if n < 3 {
            return Self::linear(n);
        }
        let edges = (0..n).map(|i| (i, (i + 1) % n));
        Self::from_edges(n, edges).expect("ring edges are in range")
    }

    /// Star topology: node 0 coupled to every other node.
    pub fn star(n: u32) -> Self {
        let edges = (1..n).map(|i| (0, i));
        Self::from_edges(n, edges).expect("star edges are in range")
    }

    /// Rectangular grid topology with row-major node numbering.
    pub fn grid(rows: u32, cols: u32) -> Self {
        let mut edges = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let node = r * cols + c;
                if c + 1 < cols {
                    edges.push((node, node + 1));
                }
                if r + 1 < rows {
                    edges.push((node, node + cols));
                }
            }
        }
        Self::from_edges(rows * cols, edges).expect("grid edges are in range")
    }
}
