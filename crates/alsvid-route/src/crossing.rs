//! Crossing and intersection detection.
//!
//! A *crossing* is a node shared by two or more candidate paths in a round.
//! An *intersection* is a crossing that additionally sits on a split
//! boundary of one of the sharing paths: the boundary nodes are where a
//! path parks its endpoint qubits, so a later path swapping through that
//! node would corrupt the earlier path's result. Crossings away from every
//! boundary are harmless as long as the sharing paths execute in priority
//! order; intersections must be resolved by shifting a split, reordering
//! priorities, or discarding a path.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use crate::container::PathId;
use crate::path::SplitPath;

/// A recorded crossing between two paths: `other` shares `node` with the
/// path under whose id this record is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossingRec {
    /// The other path sharing the node.
    pub other: PathId,
    /// The shared node.
    pub node: u32,
}

/// Classified conflict between paths sharing a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// The shared node lies away from every sharing path's split boundary.
    /// Safe under priority-ordered execution; no action required.
    Crossing { node: u32, paths: Vec<PathId> },
    /// The shared node anchors at least one sharing path's split boundary
    /// and must be resolved before swaps are emitted.
    Intersection { node: u32, paths: Vec<PathId> },
}

impl Conflict {
    /// The shared node.
    pub fn node(&self) -> u32 {
        match self {
            Conflict::Crossing { node, .. } | Conflict::Intersection { node, .. } => *node,
        }
    }

    /// The sharing paths, ascending.
    pub fn paths(&self) -> &[PathId] {
        match self {
            Conflict::Crossing { paths, .. } | Conflict::Intersection { paths, .. } => paths,
        }
    }
}

/// Map every node visited by more than one path to its `(path, position)`
/// occurrences. Positions index into the rejoined node sequence.
pub fn detect_crossings(
    paths: &BTreeMap<PathId, SplitPath>,
) -> FxHashMap<u32, Vec<(PathId, usize)>> {
    let mut occurrences: FxHashMap<u32, Vec<(PathId, usize)>> = FxHashMap::default();
    for (&path_id, split) in paths {
        for (position, node) in split.nodes().enumerate() {
            occurrences.entry(node).or_default().push((path_id, position));
        }
    }
    occurrences.retain(|_, hits| hits.len() > 1);
    occurrences
}

/// Classify every shared node as a crossing or an intersection.
///
/// Output is sorted by node for deterministic reporting.
pub fn classify(paths: &BTreeMap<PathId, SplitPath>) -> Vec<Conflict> {
    let occurrences = detect_crossings(paths);
    let mut nodes: Vec<u32> = occurrences.keys().copied().collect();
    nodes.sort_unstable();

    nodes
        .into_iter()
        .map(|node| {
            let sharing: Vec<PathId> = occurrences[&node].iter().map(|&(id, _)| id).collect();
            let anchored = sharing.iter().any(|id| {
                let (head_end, tail_start) = paths[id].boundary();
                node == head_end || node == tail_start
            });
            if anchored {
                Conflict::Intersection { node, paths: sharing }
            } else {
                Conflict::Crossing { node, paths: sharing }
            }
        })
        .collect()
}

/// Find the intersections among recorded crossings.
///
/// A crossing node is an intersection for a path iff it coincides with the
/// end of that path's head half or the start of its tail half. Returns a
/// map from intersection node to the set of paths anchored there.
pub fn find_intersections(
    paths: &BTreeMap<PathId, SplitPath>,
    crossings: &BTreeMap<PathId, Vec<CrossingRec>>,
) -> FxHashMap<u32, BTreeSet<PathId>> {
    let mut intersections: FxHashMap<u32, BTreeSet<PathId>> = FxHashMap::default();
    for (&path_id, split) in paths {
        let (head_end, tail_start) = split.boundary();
        for rec in crossings.get(&path_id).into_iter().flatten() {
            if rec.node == head_end || rec.node == tail_start {
                intersections.entry(rec.node).or_default().insert(path_id);
            }
        }
    }
    intersections
}

/// Attempt to turn an intersection into a plain crossing by shifting the
/// split boundary.
///
/// `head_free[i]` / `tail_free[i]` flag whether the corresponding node of
/// the half is free of crossings; the boundary may only move onto
/// crossing-free nodes, otherwise the shift would create a new
/// intersection. The flag vectors are kept in step with the halves.
///
/// Returns `true` if the split was shifted. A crossing pinned at position 0
/// or the final position of the path can never be shifted away (the
/// endpoints are fixed), so such conflicts stay unresolved here and fall
/// back to the resolver's reorder-or-discard handling.
pub fn try_shift_split(
    intersection_node: u32,
    split: &mut SplitPath,
    head_free: &mut Vec<bool>,
    tail_free: &mut Vec<bool>,
) -> bool {
    if split.len() < 4 {
        return false;
    }

    let (head_end, _) = split.boundary();
    if head_end == intersection_node {
        // Try moving the first tail node onto the head.
        if tail_free.len() > 1 && tail_free[0] && tail_free[1] {
            split.grow_head();
            head_free.push(tail_free.remove(0));
            return true;
        }
    } else {
        // Try moving the last head node onto the tail.
        let n = head_free.len();
        if n > 1 && head_free[n - 1] && head_free[n - 2] {
            split.grow_tail();
            if let Some(flag) = head_free.pop() {
                tail_free.insert(0, flag);
            }
            return true;
        }
    }

    // Try moving the last two head nodes onto the tail.
    let n = head_free.len();
    if n > 2 && head_free[n - 2] && head_free[n - 3] {
        for _ in 0..2 {
            split.grow_tail();
            if let Some(flag) = head_free.pop() {
                tail_free.insert(0, flag);
            }
        }
        return true;
    }

    // Try moving the first two tail nodes onto the head.
    if tail_free.len() > 2 && tail_free[1] && tail_free[2] {
        for _ in 0..2 {
            split.grow_head();
            head_free.push(tail_free.remove(0));
        }
        return true;
    }

    false
}
