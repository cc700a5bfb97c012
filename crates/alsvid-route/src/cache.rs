//! Path caches.
//!
//! Two variants share the same role of avoiding redundant graph search
//! across scheduling rounds:
//!
//! - [`PathCache`]: at most one path per logical interaction, validated
//!   against the mapping before every hit. A stale entry (the mapping moved
//!   an endpoint since the path was stored) is evicted and recomputed,
//!   never returned.
//! - [`ExhaustiveCache`]: every shortest path per physical endpoint pair.
//!   Physical paths depend only on the immutable topology, so entries never
//!   go stale; they are consulted when a first-choice path conflicts and an
//!   equal-length alternate is needed.

use rustc_hash::FxHashMap;
use tracing::debug;

use alsvid_graph::{GraphResult, Topology};

use crate::mapping::Mapping;
use crate::path::{InteractionKey, PairKey};

/// Hit/miss/eviction counters for a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Clone)]
struct CachedPath {
    path: Vec<u32>,
    /// Physical locations of the interaction endpoints when stored,
    /// oriented from the key's smaller logical qubit.
    start: u32,
    end: u32,
    /// Mapping version when stored or last revalidated.
    version: u64,
}

/// One remembered path per logical interaction, with mapping-version
/// invalidation tokens.
#[derive(Debug, Default)]
pub struct PathCache {
    entries: FxHashMap<InteractionKey, CachedPath>,
    stats: CacheStats,
}

impl PathCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the path for an interaction.
    ///
    /// The entry is returned only while both endpoints still sit at the
    /// physical locations remembered when it was stored. The check is made
    /// against the mapping actually passed in, never against the version
    /// token alone: counters of distinct mapping instances can collide, so
    /// the token only records when the entry was last revalidated. A stale
    /// entry is evicted and `None` is returned so the caller recomputes.
    pub fn get(&mut self, key: InteractionKey, mapping: &Mapping) -> Option<&[u32]> {
        let valid = match self.entries.get(&key) {
            None => {
                self.stats.misses += 1;
                return None;
            }
            Some(entry) => {
                let endpoints_in_place = mapping.physical(key.a) == Some(entry.start)
                    && mapping.physical(key.b) == Some(entry.end);
                if !endpoints_in_place {
                    debug!(
                        stored_version = entry.version,
                        "evicting stale cached path for {key}"
                    );
                }
                endpoints_in_place
            }
        };

        if valid {
            self.stats.hits += 1;
            let entry = self.entries.get_mut(&key)?;
            entry.version = mapping.version();
            Some(entry.path.as_slice())
        } else {
            self.stats.misses += 1;
            self.stats.evictions += 1;
            self.entries.remove(&key);
            None
        }
    }

    /// Store the path for an interaction under the current mapping state.
    ///
    /// The path must run between the current physical locations of the
    /// key's qubits; entries for unmapped qubits are ignored.
    pub fn put(&mut self, key: InteractionKey, path: &[u32], mapping: &Mapping) {
        let (Some(start), Some(end)) = (mapping.physical(key.a), mapping.physical(key.b)) else {
            return;
        };
        self.entries.insert(
            key,
            CachedPath {
                path: path.to_vec(),
                start,
                end,
                version: mapping.version(),
            },
        );
    }

    /// Drop the entry for one interaction.
    pub fn invalidate(&mut self, key: InteractionKey) {
        if self.entries.remove(&key).is_some() {
            self.stats.evictions += 1;
        }
    }

    /// Drop every entry. Called when the mapping is rebuilt wholesale.
    pub fn invalidate_all(&mut self) {
        self.stats.evictions += self.entries.len() as u64;
        self.entries.clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// Every shortest path per physical endpoint pair.
///
/// Inserting a set of paths also seeds the cache with all of their
/// sub-paths of at least `threshold` nodes: a sub-path of a shortest path
/// is itself shortest in an unweighted graph, so later queries for nearby
/// pairs are answered without another search. Seeded entries hold only the
/// sub-paths embedded in the longer query and are marked partial; a direct
/// query upgrades them to the full enumeration so no equal-length
/// alternate is missed.
#[derive(Debug)]
pub struct ExhaustiveCache {
    entries: FxHashMap<PairKey, StoredPaths>,
    threshold: usize,
    stats: CacheStats,
}

#[derive(Debug, Clone, Default)]
struct StoredPaths {
    paths: Vec<Vec<u32>>,
    /// Whether `paths` is the full enumeration for this pair, as opposed
    /// to only what sub-path seeding happened to contribute.
    complete: bool,
}

impl Default for ExhaustiveCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ExhaustiveCache {
    /// Minimum sub-path node count worth caching.
    const DEFAULT_THRESHOLD: usize = 3;

    /// Create an empty cache with the default sub-path threshold.
    pub fn new() -> Self {
        Self::with_threshold(Self::DEFAULT_THRESHOLD)
    }

    /// Create an empty cache with a custom sub-path threshold (in nodes).
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            threshold: threshold.max(2),
            stats: CacheStats::default(),
        }
    }

    /// All cached shortest paths between two physical nodes, oriented from
    /// the smaller node, sorted lexicographically.
    pub fn get(&self, a: u32, b: u32) -> Option<&[Vec<u32>]> {
        self.entries
            .get(&PairKey::new(a, b))
            .map(|stored| stored.paths.as_slice())
    }

    /// All shortest paths between two physical nodes, computing and caching
    /// them (plus their sub-paths) on first use. A partial entry left by
    /// sub-path seeding is upgraded to the full enumeration here.
    ///
    /// The returned paths are oriented from `a` to `b`.
    pub fn get_or_compute(
        &mut self,
        topology: &Topology,
        a: u32,
        b: u32,
    ) -> GraphResult<Vec<Vec<u32>>> {
        let key = PairKey::new(a, b);
        let complete = self.entries.get(&key).is_some_and(|stored| stored.complete);
        if complete {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            let paths = topology.all_shortest_paths(key.0, key.1)?;
            self.seed(paths);
            if let Some(stored) = self.entries.get_mut(&key) {
                stored.complete = true;
            }
        }

        let stored = self
            .entries
            .get(&key)
            .map(|stored| stored.paths.as_slice())
            .unwrap_or(&[]);
        Ok(orient(stored, a))
    }

    /// Store a set of shortest paths and all of their sub-paths of at least
    /// the threshold node count.
    ///
    /// Entries created here are partial: they hold only what these paths
    /// embed, not necessarily every shortest path for their pair.
    pub fn seed(&mut self, paths: Vec<Vec<u32>>) {
        for path in paths {
            let length = path.len();
            if length < 2 {
                continue;
            }
            for start in 0..length.saturating_sub(self.threshold - 1) {
                for end in (start + self.threshold - 1..length).rev() {
                    self.insert_one(&path[start..=end]);
                }
            }
            // The full path is always kept, even below the threshold.
            self.insert_one(&path);
        }
        for stored in self.entries.values_mut() {
            stored.paths.sort();
            stored.paths.dedup();
        }
    }

    fn insert_one(&mut self, path: &[u32]) {
        let key = PairKey::new(path[0], path[path.len() - 1]);
        // Store oriented from the smaller endpoint.
        let oriented = if path[0] == key.0 {
            path.to_vec()
        } else {
            let mut reversed = path.to_vec();
            reversed.reverse();
            reversed
        };
        self.entries.entry(key).or_default().paths.push(oriented);
    }

    /// Drop every entry.
    pub fn invalidate_all(&mut self) {
        self.stats.evictions += self.entries.len() as u64;
        self.entries.clear();
    }

    /// Number of cached endpoint pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// Orient stored paths so each starts at `from`.
fn orient(paths: &[Vec<u32>], from: u32) -> Vec<Vec<u32>> {
    paths
        .iter()
        .map(|path| {
            if path.first() == Some(&from) {
                path.clone()
            } else {
                let mut reversed = path.clone();
                reversed.reverse();
                reversed
            }
        })
        .collect()
}
