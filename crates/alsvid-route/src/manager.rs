//! Round orchestration: from interaction requirements to swap groups.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, info, instrument};

use alsvid_graph::Topology;

use crate::cache::{CacheStats, ExhaustiveCache, PathCache};
use crate::container::PathContainer;
use crate::crossing::Conflict;
use crate::error::{RouteError, RouteResult};
use crate::mapping::{Mapping, QubitId};
use crate::path::{InteractionKey, SwapGroup};
use crate::schedule;

/// Outcome of one scheduling round.
///
/// Every requirement passed to [`PathManager::resolve`] lands in exactly
/// one bucket (degenerate same-qubit pairs and duplicates of an earlier
/// requirement are folded into the first occurrence).
#[derive(Debug, Clone, Default)]
pub struct RoundReport {
    /// Time-ordered swap groups; swaps within a group touch disjoint nodes.
    pub groups: Vec<SwapGroup>,
    /// Pairs adjacent under the entering mapping. They can execute before
    /// any swap of this round is applied.
    pub ready: Vec<InteractionKey>,
    /// Pairs that become adjacent once all groups are applied in order.
    pub routed: Vec<InteractionKey>,
    /// Pairs that could not be scheduled this round and should be retried
    /// after the groups have been applied.
    pub deferred: Vec<InteractionKey>,
    /// Pairs whose endpoints sit in different connectivity components.
    /// Retrying cannot help; the caller must re-map.
    pub disconnected: Vec<InteractionKey>,
    /// Pairs with at least one qubit absent from the mapping.
    pub unmapped: Vec<InteractionKey>,
}

impl RoundReport {
    /// Total number of swaps across all groups.
    pub fn num_swaps(&self) -> usize {
        self.groups.iter().map(SwapGroup::len).sum()
    }

    /// Check whether the round produced neither swaps nor any categorized
    /// pair.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
            && self.ready.is_empty()
            && self.routed.is_empty()
            && self.deferred.is_empty()
            && self.disconnected.is_empty()
            && self.unmapped.is_empty()
    }
}

/// Plans swap rounds over a fixed topology.
///
/// The manager owns its caches and working state exclusively; the
/// logical-to-physical [`Mapping`] stays with the caller, which applies the
/// returned groups ([`Mapping::apply`]) between rounds.
#[derive(Debug)]
pub struct PathManager {
    topology: Arc<Topology>,
    container: PathContainer,
    cache: PathCache,
    exhaustive: ExhaustiveCache,
    caching: bool,
    stats: rustc_hash::FxHashMap<InteractionKey, u64>,
}

impl PathManager {
    /// Create a manager with interaction-path caching enabled.
    pub fn new(topology: Arc<Topology>) -> Self {
        Self::with_caching(topology, true)
    }

    /// Create a manager, optionally disabling the per-interaction path
    /// cache. The exhaustive shortest-path cache is always kept: it depends
    /// only on the immutable topology.
    pub fn with_caching(topology: Arc<Topology>, caching: bool) -> Self {
        PathManager {
            topology,
            container: PathContainer::new(),
            cache: PathCache::new(),
            exhaustive: ExhaustiveCache::new(),
            caching,
            stats: rustc_hash::FxHashMap::default(),
        }
    }

    /// The topology this manager plans against.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Plan one swap round for a batch of two-qubit requirements.
    ///
    /// Requirements are considered in input order, which doubles as the
    /// priority order when paths conflict: earlier requirements win and
    /// later ones are deferred. The mapping is only read; the caller
    /// executes the `ready` pairs, applies the returned groups, then the
    /// `routed` pairs.
    #[instrument(skip(self, mapping, requirements), fields(requirements = requirements.len()))]
    pub fn resolve(
        &mut self,
        requirements: &[(QubitId, QubitId)],
        mapping: &Mapping,
    ) -> RouteResult<RoundReport> {
        self.container.clear();

        let mut report = RoundReport::default();
        let mut pending: Vec<InteractionKey> = Vec::new();
        let mut seen: FxHashSet<InteractionKey> = FxHashSet::default();

        for &(qa, qb) in requirements {
            if qa == qb {
                debug!("ignoring degenerate requirement {qa}~{qb}");
                continue;
            }
            let key = InteractionKey::new(qa, qb);
            if !seen.insert(key) {
                *self.stats.entry(key).or_insert(0) += 1;
                continue;
            }
            *self.stats.entry(key).or_insert(0) += 1;

            let (Some(pa), Some(pb)) = (mapping.physical(key.a), mapping.physical(key.b)) else {
                debug!("requirement {key} has an unmapped qubit");
                report.unmapped.push(key);
                continue;
            };
            if !self.topology.same_component(pa, pb) {
                debug!("requirement {key} spans components ({pa} vs {pb})");
                report.disconnected.push(key);
                continue;
            }
            if self.topology.has_edge(pa, pb) {
                debug!("requirement {key} is already adjacent ({pa}-{pb})");
                report.ready.push(key);
                continue;
            }

            pending.push(key);
            if !self.admit_path(key, pa, pb, mapping)? {
                debug!("requirement {key} deferred: no conflict-free path");
            }
        }

        let conflicts = self.container.conflicts();
        if !conflicts.is_empty() {
            let intersections = conflicts
                .iter()
                .filter(|c| matches!(c, Conflict::Intersection { .. }))
                .count();
            debug!(
                crossings = conflicts.len() - intersections,
                intersections, "accepted paths share nodes"
            );
        }

        let evicted = self.container.resolve_intersections()?;
        for (id, split) in &evicted {
            debug!("path {id} ({split}) deferred while resolving intersections");
        }

        for (&id, split) in self.container.paths() {
            if let Err(detail) = split.validate(&self.topology) {
                return Err(RouteError::InvalidSplit { path_id: id, detail });
            }
        }

        report.groups = schedule::pack_groups(self.container.paths())?;

        // Routed pairs are read back from the surviving paths, so anything
        // evicted along the way falls through to the deferred bucket.
        let routed: FxHashSet<InteractionKey> = self
            .container
            .paths()
            .values()
            .filter_map(|split| {
                let a = mapping.logical(split.start())?;
                let b = mapping.logical(split.end())?;
                Some(InteractionKey::new(a, b))
            })
            .collect();
        for key in pending {
            if routed.contains(&key) {
                report.routed.push(key);
            } else {
                report.deferred.push(key);
            }
        }

        info!(
            swaps = report.num_swaps(),
            groups = report.groups.len(),
            ready = report.ready.len(),
            routed = report.routed.len(),
            deferred = report.deferred.len(),
            "round planned"
        );
        Ok(report)
    }

    /// Find a shortest path for one requirement and offer it to the
    /// container, falling back to equal-length alternates on rejection.
    ///
    /// Returns whether a path was accepted.
    fn admit_path(
        &mut self,
        key: InteractionKey,
        pa: u32,
        pb: u32,
        mapping: &Mapping,
    ) -> RouteResult<bool> {
        if self.caching {
            if let Some(path) = self.cache.get(key, mapping) {
                let path = path.to_vec();
                let outcome = self.container.try_add(&path)?;
                if outcome.added {
                    return Ok(true);
                }
                self.cache.invalidate(key);
            }
        }

        // Candidates come back lexicographically ordered, so the choice
        // among equal-length paths is deterministic.
        let candidates = self.exhaustive.get_or_compute(&self.topology, pa, pb)?;
        for candidate in &candidates {
            let outcome = self.container.try_add(candidate)?;
            if outcome.added {
                if self.caching {
                    self.cache.put(key, candidate, mapping);
                }
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Drop all cached paths. Call after re-mapping wholesale.
    pub fn clear_cache(&mut self) {
        self.cache.invalidate_all();
    }

    /// How often each interaction has been requested.
    pub fn interaction_stats(&self) -> &rustc_hash::FxHashMap<InteractionKey, u64> {
        &self.stats
    }

    /// Counters of the per-interaction path cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
