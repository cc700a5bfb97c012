//! Packing of per-path swap chains into parallel swap groups.
//!
//! Each accepted path contributes two swap chains, one per half, that walk
//! the path's endpoint qubits inward to the split boundary. Within a chain
//! the swaps are strictly ordered; across chains they are independent
//! except where paths cross. The packer greedily fills groups such that
//!
//! * no two swaps in a group touch a common node, and
//! * at a node shared by several paths, all swaps of a higher-priority
//!   (lower-id) path touching that node execute in earlier groups than any
//!   swap of a lower-priority path touching it.
//!
//! The second rule reproduces sequential per-priority execution exactly
//! where paths interact while letting everything else run in parallel.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::container::PathId;
use crate::crossing;
use crate::error::{RouteError, RouteResult};
use crate::path::{SplitPath, Swap, SwapGroup};

/// Pack the swap chains of the given paths into time-ordered parallel
/// groups. Paths must already be free of intersections.
pub fn pack_groups(paths: &BTreeMap<PathId, SplitPath>) -> RouteResult<Vec<SwapGroup>> {
    // Two pending chains per path, in priority order.
    let mut chains: Vec<(PathId, VecDeque<Swap>)> = Vec::new();
    for (&id, split) in paths {
        let (head_swaps, tail_swaps) = split.swap_chains();
        chains.push((id, head_swaps.into()));
        chains.push((id, tail_swaps.into()));
    }

    let shared: FxHashSet<u32> = crossing::detect_crossings(paths).keys().copied().collect();

    // Per shared node: which paths still have pending swaps touching it,
    // and how many such swaps each has left.
    let mut pending_at: FxHashMap<u32, BTreeSet<PathId>> = FxHashMap::default();
    let mut touch_count: FxHashMap<(PathId, u32), usize> = FxHashMap::default();
    for (id, chain) in &chains {
        for swap in chain {
            for node in [swap.0, swap.1] {
                if shared.contains(&node) {
                    pending_at.entry(node).or_default().insert(*id);
                    *touch_count.entry((*id, node)).or_insert(0) += 1;
                }
            }
        }
    }

    let mut groups = Vec::new();
    let mut remaining: usize = chains.iter().map(|(_, c)| c.len()).sum();
    while remaining > 0 {
        let mut group = Vec::new();
        let mut used: FxHashSet<u32> = FxHashSet::default();

        for (id, chain) in &mut chains {
            let Some(&swap) = chain.front() else {
                continue;
            };
            if used.contains(&swap.0) || used.contains(&swap.1) {
                continue;
            }
            // A swap touching a shared node waits until every
            // higher-priority path is done with that node.
            let blocked = [swap.0, swap.1].iter().any(|node| {
                pending_at
                    .get(node)
                    .is_some_and(|ids| ids.iter().next().is_some_and(|&min| min < *id))
            });
            if blocked {
                continue;
            }

            chain.pop_front();
            remaining -= 1;
            used.insert(swap.0);
            used.insert(swap.1);
            for node in [swap.0, swap.1] {
                if let Some(count) = touch_count.get_mut(&(*id, node)) {
                    *count -= 1;
                    if *count == 0 {
                        if let Some(ids) = pending_at.get_mut(&node) {
                            ids.remove(id);
                        }
                    }
                }
            }
            group.push(swap);
        }

        if group.is_empty() {
            // The highest-priority pending chain is never blocked, so this
            // cannot happen with a consistent container.
            return Err(RouteError::CorruptContainer(format!(
                "swap scheduling stalled with {remaining} swaps pending"
            )));
        }
        debug!(group = groups.len(), swaps = group.len(), "packed swap group");
        groups.push(SwapGroup(group));
    }
    Ok(groups)
}
