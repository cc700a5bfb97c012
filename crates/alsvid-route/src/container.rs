//! Round-scoped working set of accepted paths.
//!
//! The container holds the split paths accepted so far in a scheduling
//! round, indexed by a priority id (lower id executes first). It tolerates
//! paths that share a single node, tracks those crossings, and resolves the
//! ones that land on a split boundary by shifting splits, reordering
//! priorities or, as a last resort, discarding the lower-priority path.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::crossing::{self, Conflict, CrossingRec};
use crate::error::{RouteError, RouteResult};
use crate::path::SplitPath;

/// Priority id of a path within a round. Lower ids execute first.
pub type PathId = usize;

/// Result of [`PathContainer::try_add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// Whether the new path was accepted.
    pub added: bool,
    /// Previously accepted paths discarded while resolving the conflicts
    /// the new path introduced.
    pub evicted: Vec<(PathId, SplitPath)>,
}

impl AddOutcome {
    fn rejected() -> Self {
        AddOutcome {
            added: false,
            evicted: vec![],
        }
    }
}

/// Container for the paths of one scheduling round.
#[derive(Debug, Default)]
pub struct PathContainer {
    /// Accepted paths by priority id.
    paths: BTreeMap<PathId, SplitPath>,
    /// Crossing records per path. Every accepted path has an entry.
    crossings: BTreeMap<PathId, Vec<CrossingRec>>,
    /// Next id to assign.
    next_id: PathId,
}

impl PathContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepted paths, by ascending priority id.
    pub fn paths(&self) -> &BTreeMap<PathId, SplitPath> {
        &self.paths
    }

    /// Look up a path by id.
    pub fn get(&self, id: PathId) -> Option<&SplitPath> {
        self.paths.get(&id)
    }

    /// Number of accepted paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check whether the container holds no paths.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Every node visited by at least one accepted path.
    pub fn all_nodes(&self) -> BTreeSet<u32> {
        self.paths.values().flat_map(SplitPath::nodes).collect()
    }

    /// Check whether some accepted path already links these two endpoints.
    pub fn has_interaction(&self, a: u32, b: u32) -> bool {
        self.paths.values().any(|split| {
            let (start, end) = (split.start(), split.end());
            (start == a && end == b) || (start == b && end == a)
        })
    }

    /// Check whether a node is the endpoint of some accepted path.
    pub fn is_endpoint(&self, node: u32) -> bool {
        self.paths
            .values()
            .any(|split| split.start() == node || split.end() == node)
    }

    /// Nodes where the given path crosses other accepted paths.
    pub fn crossing_nodes(&self, id: PathId) -> FxHashSet<u32> {
        self.crossings
            .get(&id)
            .into_iter()
            .flatten()
            .map(|rec| rec.node)
            .collect()
    }

    /// Classified view of every node shared between accepted paths,
    /// sorted by node.
    pub fn conflicts(&self) -> Vec<Conflict> {
        crossing::classify(&self.paths)
    }

    /// The largest number of accepted paths sharing a single node
    /// (0 when no node is shared).
    pub fn max_crossing_order(&self) -> usize {
        crossing::detect_crossings(&self.paths)
            .values()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }

    /// Reset the container for a new round.
    pub fn clear(&mut self) {
        self.paths.clear();
        self.crossings.clear();
        self.next_id = 0;
    }

    /// Try to accept a new path at the lowest free priority.
    ///
    /// The path is rejected when it visits an endpoint of an accepted path,
    /// ends on a node an accepted path passes through, repeats a node, or
    /// overlaps an accepted path in more than one node.
    /// A single-node overlap is recorded as a crossing; if that crossing
    /// lands on a split boundary it is resolved immediately, which may
    /// discard the new path itself (rejection) or a previously accepted one
    /// (reported in [`AddOutcome::evicted`]).
    pub fn try_add(&mut self, path: &[u32]) -> RouteResult<AddOutcome> {
        for split in self.paths.values() {
            if path.contains(&split.start()) || path.contains(&split.end()) {
                return Ok(AddOutcome::rejected());
            }
        }
        // The new path's own endpoints may not lie on an accepted path
        // either: the earlier path's sweep would displace the qubit parked
        // there before this path delivers it.
        if let (Some(&first), Some(&last)) = (path.first(), path.last()) {
            for split in self.paths.values() {
                if split.contains(first) || split.contains(last) {
                    return Ok(AddOutcome::rejected());
                }
            }
        }
        let unique: FxHashSet<u32> = path.iter().copied().collect();
        if unique.len() != path.len() {
            return Ok(AddOutcome::rejected());
        }

        let new_split = SplitPath::from_path(path)?;
        let id = self.next_id;
        let (new_head_end, new_tail_start) = new_split.boundary();

        let mut new_crossings = Vec::new();
        let mut new_intersections: rustc_hash::FxHashMap<u32, BTreeSet<PathId>> =
            rustc_hash::FxHashMap::default();
        for (&other, other_split) in &self.paths {
            let overlap: Vec<u32> = path
                .iter()
                .copied()
                .filter(|n| other_split.contains(*n))
                .collect();
            if overlap.len() > 1 {
                return Ok(AddOutcome::rejected());
            }
            if let [node] = overlap[..] {
                new_crossings.push(CrossingRec { other, node });
                if node == new_head_end || node == new_tail_start {
                    new_intersections.entry(node).or_default().insert(id);
                }
                let (other_head_end, other_tail_start) = other_split.boundary();
                if node == other_head_end || node == other_tail_start {
                    new_intersections.entry(node).or_default().insert(other);
                }
            }
        }

        self.paths.insert(id, new_split);
        for rec in &new_crossings {
            self.crossings
                .entry(rec.other)
                .or_default()
                .push(CrossingRec {
                    other: id,
                    node: rec.node,
                });
        }
        self.crossings.insert(id, new_crossings);

        // Intersections anchored only by the new path resolve themselves:
        // the new path has the highest id and executes after the others.
        new_intersections.retain(|_, ids| ids.len() > 1 || !ids.contains(&id));

        let mut evicted = Vec::new();
        if !new_intersections.is_empty() {
            evicted = self.solve(new_intersections)?;
        }

        if !self.paths.contains_key(&id) {
            evicted.retain(|(evicted_id, _)| *evicted_id != id);
            return Ok(AddOutcome {
                added: false,
                evicted,
            });
        }
        self.next_id += 1;
        Ok(AddOutcome {
            added: true,
            evicted,
        })
    }

    /// Remove a path by id, cleaning up every crossing record that
    /// references it. Returns the removed path.
    pub fn remove(&mut self, id: PathId) -> RouteResult<SplitPath> {
        let split = self
            .paths
            .remove(&id)
            .ok_or_else(|| RouteError::CorruptContainer(format!("unknown path id {id}")))?;
        self.crossings.remove(&id);
        for recs in self.crossings.values_mut() {
            recs.retain(|rec| rec.other != id);
        }
        Ok(split)
    }

    /// Exchange the priorities of two paths.
    pub fn swap_priority(&mut self, id1: PathId, id2: PathId) -> RouteResult<()> {
        if id1 == id2 {
            return Ok(());
        }
        for id in [id1, id2] {
            if !self.paths.contains_key(&id) {
                return Err(RouteError::CorruptContainer(format!("unknown path id {id}")));
            }
        }
        if let (Some(path1), Some(path2)) = (self.paths.remove(&id1), self.paths.remove(&id2)) {
            self.paths.insert(id1, path2);
            self.paths.insert(id2, path1);
        }

        for recs in self.crossings.values_mut() {
            for rec in recs {
                if rec.other == id1 {
                    rec.other = id2;
                } else if rec.other == id2 {
                    rec.other = id1;
                }
            }
        }
        let recs1 = self.crossings.remove(&id1).unwrap_or_default();
        let recs2 = self.crossings.remove(&id2).unwrap_or_default();
        self.crossings.insert(id1, recs2);
        self.crossings.insert(id2, recs1);
        Ok(())
    }

    /// Discard paths until no node is shared by more than `order` paths.
    ///
    /// Paths with the most offending nodes go first, ties to the larger
    /// (lower-priority) id. Returns the discarded paths.
    pub fn drop_crossings_above(&mut self, order: usize) -> RouteResult<Vec<(PathId, SplitPath)>> {
        let mut evicted = Vec::new();
        while self.max_crossing_order() > order {
            let occurrences = crossing::detect_crossings(&self.paths);
            let mut offenders: Vec<(usize, PathId)> = self
                .paths
                .keys()
                .map(|&id| {
                    let count = occurrences
                        .values()
                        .filter(|hits| hits.len() > order && hits.iter().any(|&(p, _)| p == id))
                        .count();
                    (count, id)
                })
                .collect();
            offenders.sort_unstable();
            let Some(&(count, victim)) = offenders.last() else {
                break;
            };
            if count == 0 {
                break;
            }
            let split = self.remove(victim)?;
            evicted.push((victim, split));
        }
        Ok(evicted)
    }

    /// Resolve every intersection currently present in the container.
    ///
    /// Plain [`Conflict::Crossing`]s are left alone; the anchored paths of
    /// every [`Conflict::Intersection`] are fed to the resolution loop.
    /// Returns the paths that had to be discarded (deferred to a later
    /// round) because no split shift could clear their conflict.
    pub fn resolve_intersections(&mut self) -> RouteResult<Vec<(PathId, SplitPath)>> {
        let mut intersections: rustc_hash::FxHashMap<u32, BTreeSet<PathId>> =
            rustc_hash::FxHashMap::default();
        for conflict in self.conflicts() {
            let Conflict::Intersection { node, paths } = conflict else {
                continue;
            };
            let anchored: BTreeSet<PathId> = paths
                .into_iter()
                .filter(|id| {
                    self.paths.get(id).is_some_and(|split| {
                        let (head_end, tail_start) = split.boundary();
                        head_end == node || tail_start == node
                    })
                })
                .collect();
            intersections.insert(node, anchored);
        }
        let mut evicted = self.solve(intersections)?;
        evicted.extend(self.enforce_priority_order()?);
        Ok(evicted)
    }

    /// Re-establish, with fresh data, that every path parked on a shared
    /// node holds the largest id among that node's sharers.
    ///
    /// The demotions performed while solving rename ids globally, so fixing
    /// one node can disturb another; in rare cyclic arrangements no id
    /// assignment satisfies all nodes at once. Paths still parked too early
    /// after re-demotion are discarded.
    fn enforce_priority_order(&mut self) -> RouteResult<Vec<(PathId, SplitPath)>> {
        let mut evicted = Vec::new();
        loop {
            for _ in 0..2 {
                let mut changed = false;
                let mut nodes: Vec<u32> = crossing::find_intersections(&self.paths, &self.crossings)
                    .keys()
                    .copied()
                    .collect();
                nodes.sort_unstable();
                for node in nodes {
                    let fresh = crossing::find_intersections(&self.paths, &self.crossings);
                    let Some(ids) = fresh.get(&node) else {
                        continue;
                    };
                    for &id in ids {
                        changed |= self.demote_anchored(node, id)?;
                    }
                }
                if !changed {
                    break;
                }
            }
            let Some((node, id)) = self.first_priority_violation() else {
                return Ok(evicted);
            };
            let split = self.remove(id)?;
            debug!("discarding path {id} ({split}) parked too early at node {node}");
            evicted.push((id, split));
        }
    }

    /// Smallest shared node where the parked path does not hold the
    /// largest id among the sharers, with that path's id.
    fn first_priority_violation(&self) -> Option<(u32, PathId)> {
        let intersections = crossing::find_intersections(&self.paths, &self.crossings);
        let mut nodes: Vec<u32> = intersections.keys().copied().collect();
        nodes.sort_unstable();
        for node in nodes {
            for &id in &intersections[&node] {
                let max_sharer = self
                    .crossings
                    .get(&id)
                    .into_iter()
                    .flatten()
                    .filter(|rec| rec.node == node)
                    .map(|rec| rec.other)
                    .max();
                if max_sharer.is_some_and(|max| max > id) {
                    return Some((node, id));
                }
            }
        }
        None
    }

    /// Core resolution loop.
    ///
    /// Intersections are processed in ascending (anchor count, total path
    /// nodes, node) order, from the back of the worklist. A node anchored
    /// by a single path is demoted by reordering priorities so the sharing
    /// paths execute first. A node anchored by several paths is attacked by
    /// shifting the splits of the two longest ones; if neither shift works,
    /// the lower-priority path is discarded and the worklist is rebuilt.
    fn solve(
        &mut self,
        mut intersections: rustc_hash::FxHashMap<u32, BTreeSet<PathId>>,
    ) -> RouteResult<Vec<(PathId, SplitPath)>> {
        let mut evicted = Vec::new();
        let mut worklist = self.sorted_intersections(&intersections);

        while let Some(&node) = worklist.last() {
            let anchored = intersections.get(&node).cloned().unwrap_or_default();
            match anchored.len() {
                0 => {
                    intersections.remove(&node);
                    worklist.pop();
                }
                1 => {
                    // Only one path parks on this crossing: make sure every
                    // other path through the node executes before it.
                    if let Some(&id) = anchored.iter().next() {
                        self.demote_anchored(node, id)?;
                    }
                    intersections.remove(&node);
                    worklist.pop();
                }
                _ => {
                    let mut by_length: Vec<PathId> = anchored.iter().copied().collect();
                    by_length.sort_by_key(|id| {
                        (self.paths.get(id).map_or(0, SplitPath::len), *id)
                    });
                    let (Some(id1), Some(id2)) = (by_length.pop(), by_length.pop()) else {
                        return Err(RouteError::CorruptContainer(format!(
                            "intersection at node {node} lost its paths"
                        )));
                    };

                    let mut solved = self.shift_split_of(node, id1)?;
                    if !solved {
                        solved = self.shift_split_of(node, id2)?;
                    }
                    if !solved {
                        let victim = id1.max(id2);
                        let split = self.remove(victim)?;
                        debug!(
                            "discarding path {victim} ({split}) to clear intersection at node {node}"
                        );
                        evicted.push((victim, split));
                    }

                    intersections = crossing::find_intersections(&self.paths, &self.crossings);
                    worklist = self.sorted_intersections(&intersections);
                }
            }
        }
        Ok(evicted)
    }

    /// Reorder priorities so that every path sharing `node` with `id`
    /// executes before `id`. Returns whether anything was reordered.
    fn demote_anchored(&mut self, node: u32, id: PathId) -> RouteResult<bool> {
        let mut others: Vec<PathId> = self
            .crossings
            .get(&id)
            .into_iter()
            .flatten()
            .filter(|rec| rec.node == node)
            .map(|rec| rec.other)
            .collect();
        others.sort_unstable();

        let mut changed = false;
        let mut current = id;
        for other in others {
            if current < other {
                self.swap_priority(current, other)?;
                current = other;
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Try to move the split boundary of `id` off the intersection node.
    fn shift_split_of(&mut self, node: u32, id: PathId) -> RouteResult<bool> {
        let crossing_nodes = self.crossing_nodes(id);
        let split = self
            .paths
            .get_mut(&id)
            .ok_or_else(|| RouteError::CorruptContainer(format!("unknown path id {id}")))?;
        let mut head_free: Vec<bool> = split
            .head()
            .iter()
            .map(|n| !crossing_nodes.contains(n))
            .collect();
        let mut tail_free: Vec<bool> = split
            .tail()
            .iter()
            .map(|n| !crossing_nodes.contains(n))
            .collect();
        Ok(crossing::try_shift_split(
            node,
            split,
            &mut head_free,
            &mut tail_free,
        ))
    }

    /// Intersection nodes sorted ascending by (anchor count, total nodes of
    /// the anchored paths, node). Processing pops from the back, so the
    /// most entangled intersections are handled first.
    fn sorted_intersections(
        &self,
        intersections: &rustc_hash::FxHashMap<u32, BTreeSet<PathId>>,
    ) -> Vec<u32> {
        let mut nodes: Vec<u32> = intersections.keys().copied().collect();
        nodes.sort_by_key(|node| {
            let anchored = &intersections[node];
            let order = anchored.len();
            let points: usize = anchored
                .iter()
                .map(|id| self.paths.get(id).map_or(0, SplitPath::len))
                .sum();
            (order, points + 1 - order.min(points), *node)
        });
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn added(outcome: &AddOutcome) -> bool {
        outcome.added && outcome.evicted.is_empty()
    }

    #[test]
    fn test_add_and_query() {
        let mut container = PathContainer::new();
        assert!(added(&container.try_add(&[0, 1, 2, 3]).unwrap()));
        assert_eq!(container.len(), 1);
        assert!(container.has_interaction(0, 3));
        assert!(container.has_interaction(3, 0));
        assert!(!container.has_interaction(0, 2));
        assert!(container.is_endpoint(0));
        assert!(!container.is_endpoint(1));
        assert_eq!(container.all_nodes(), BTreeSet::from([0, 1, 2, 3]));
    }

    #[test]
    fn test_reject_path_through_existing_endpoint() {
        let mut container = PathContainer::new();
        assert!(added(&container.try_add(&[0, 1, 2]).unwrap()));
        // Node 2 is an endpoint of the accepted path.
        let outcome = container.try_add(&[5, 2, 6]).unwrap();
        assert!(!outcome.added);
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_reject_wide_overlap() {
        let mut container = PathContainer::new();
        assert!(added(&container.try_add(&[0, 1, 2, 3, 4]).unwrap()));
        // Shares nodes 1 and 2 with the accepted path.
        let outcome = container.try_add(&[5, 1, 2, 6]).unwrap();
        assert!(!outcome.added);
    }

    #[test]
    fn test_reject_repeated_node() {
        let mut container = PathContainer::new();
        let outcome = container.try_add(&[0, 1, 0]).unwrap();
        assert!(!outcome.added);
        assert!(container.is_empty());
    }

    #[test]
    fn test_single_node_crossing_recorded() {
        let mut container = PathContainer::new();
        // Boundaries: (2,3) for path 0, (6,7) for path 1; node 1 interior.
        assert!(added(&container.try_add(&[0, 1, 2, 3, 4, 10]).unwrap()));
        assert!(added(&container.try_add(&[5, 6, 7, 1, 8]).unwrap()));

        assert_eq!(container.crossing_nodes(0), FxHashSet::from_iter([1]));
        assert_eq!(container.crossing_nodes(1), FxHashSet::from_iter([1]));
        assert_eq!(container.max_crossing_order(), 2);
    }

    #[test]
    fn test_conflicts_census_drives_resolution() {
        let mut container = PathContainer::new();
        // Boundaries (2,3) and (6,7); node 1 is interior to both paths.
        assert!(added(&container.try_add(&[0, 1, 2, 3, 4, 10]).unwrap()));
        assert!(added(&container.try_add(&[5, 6, 7, 1, 8]).unwrap()));

        assert_eq!(
            container.conflicts(),
            vec![Conflict::Crossing {
                node: 1,
                paths: vec![0, 1]
            }]
        );
        // A plain crossing needs no resolution: nothing is discarded.
        assert!(container.resolve_intersections().unwrap().is_empty());
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn test_remove_cleans_crossings() {
        let mut container = PathContainer::new();
        assert!(added(&container.try_add(&[0, 1, 2, 3, 4, 10]).unwrap()));
        assert!(added(&container.try_add(&[5, 6, 7, 1, 8]).unwrap()));

        let split = container.remove(1).unwrap();
        assert_eq!(split.start(), 5);
        assert!(container.crossing_nodes(0).is_empty());
        assert_eq!(container.max_crossing_order(), 0);
        assert!(container.remove(1).is_err());
    }

    #[test]
    fn test_swap_priority() {
        let mut container = PathContainer::new();
        assert!(added(&container.try_add(&[0, 1, 2, 3, 4, 10]).unwrap()));
        assert!(added(&container.try_add(&[5, 6, 7, 1, 8]).unwrap()));

        container.swap_priority(0, 1).unwrap();
        assert_eq!(container.get(0).unwrap().start(), 5);
        assert_eq!(container.get(1).unwrap().start(), 0);
        // Crossing records follow the renumbering.
        assert_eq!(container.crossing_nodes(0), FxHashSet::from_iter([1]));
        assert!(container.swap_priority(0, 9).is_err());
    }

    #[test]
    fn test_drop_crossings_above() {
        let mut container = PathContainer::new();
        assert!(added(&container.try_add(&[0, 1, 2, 3, 4, 10]).unwrap()));
        assert!(added(&container.try_add(&[5, 6, 7, 1, 8]).unwrap()));

        let evicted = container.drop_crossings_above(1).unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].0, 1);
        assert_eq!(container.len(), 1);
        assert_eq!(container.max_crossing_order(), 0);
    }

    #[test]
    fn test_intersection_solved_by_shifting() {
        let mut container = PathContainer::new();
        // Path 0: [0,1]/[2,3,4] parks at nodes 1 and 2.
        assert!(added(&container.try_add(&[0, 1, 2, 3, 4]).unwrap()));
        // Path 1: [5,6]/[2,7,8] would also park at node 2: intersection.
        let outcome = container.try_add(&[5, 6, 2, 7, 8]).unwrap();
        assert!(outcome.added);
        assert!(outcome.evicted.is_empty());
        assert_eq!(container.len(), 2);

        // The new path's split is shifted off node 2 and then demoted out of
        // the way: it ends up executing first, with its boundary clear of
        // the crossing, while the path still parked on node 2 runs last.
        let first = container.get(0).unwrap();
        assert_eq!(first.start(), 5);
        assert_eq!(first.boundary(), (5, 6));
        let last = container.get(1).unwrap();
        assert_eq!(last.start(), 0);
        assert_eq!(last.boundary(), (1, 2));
    }

    #[test]
    fn test_unsolvable_intersection_discards_lower_priority() {
        let mut container = PathContainer::new();
        // Both paths are too short to shift and both park on node 1.
        assert!(added(&container.try_add(&[0, 1, 2]).unwrap()));
        let outcome = container.try_add(&[3, 1, 4]).unwrap();

        // The new (lower-priority) path is the one discarded.
        assert!(!outcome.added);
        assert_eq!(container.len(), 1);
        assert!(container.has_interaction(0, 2));
    }

    #[test]
    fn test_clear_resets_ids() {
        let mut container = PathContainer::new();
        assert!(added(&container.try_add(&[0, 1, 2]).unwrap()));
        container.clear();
        assert!(container.is_empty());
        assert!(added(&container.try_add(&[4, 5, 6]).unwrap()));
        assert!(container.get(0).is_some());
    }
}
