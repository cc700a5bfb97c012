//! Logical qubit identifiers and the logical-to-physical mapping.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::path::Swap;

/// Unique identifier for a logical qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// A growable bijection from logical qubits to physical nodes.
///
/// The mapping is owned by the caller: the routing layer only reads a
/// snapshot per round and returns the swaps for the caller to apply via
/// [`apply`](Self::apply). Every mutation bumps an internal version
/// counter, which the path cache uses as its invalidation token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mapping {
    /// Map from logical qubit to physical node.
    logical_to_physical: FxHashMap<QubitId, u32>,
    /// Map from physical node to logical qubit.
    physical_to_logical: FxHashMap<u32, QubitId>,
    /// Monotone counter, bumped on every mutation.
    version: u64,
}

impl Mapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a trivial mapping (logical qubit i -> physical node i).
    pub fn trivial(num_qubits: u32) -> Self {
        let mut mapping = Self::new();
        for i in 0..num_qubits {
            mapping.add(QubitId(i), i);
        }
        mapping
    }

    /// Add a logical-to-physical assignment.
    ///
    /// Conflicting previous assignments of either side are removed first so
    /// the two maps stay mutually consistent.
    pub fn add(&mut self, logical: QubitId, physical: u32) {
        if let Some(&old_logical) = self.physical_to_logical.get(&physical) {
            if old_logical != logical {
                self.logical_to_physical.remove(&old_logical);
            }
        }
        if let Some(&old_physical) = self.logical_to_physical.get(&logical) {
            if old_physical != physical {
                self.physical_to_logical.remove(&old_physical);
            }
        }
        self.logical_to_physical.insert(logical, physical);
        self.physical_to_logical.insert(physical, logical);
        self.version += 1;
    }

    /// Physical node holding a logical qubit.
    pub fn physical(&self, logical: QubitId) -> Option<u32> {
        self.logical_to_physical.get(&logical).copied()
    }

    /// Logical qubit held at a physical node.
    pub fn logical(&self, physical: u32) -> Option<QubitId> {
        self.physical_to_logical.get(&physical).copied()
    }

    /// Exchange the logical qubits held at two physical nodes.
    ///
    /// Either side may be unoccupied, in which case the occupied qubit
    /// simply moves.
    pub fn swap(&mut self, p1: u32, p2: u32) {
        let l1 = self.physical_to_logical.get(&p1).copied();
        let l2 = self.physical_to_logical.get(&p2).copied();

        if let Some(l1) = l1 {
            self.logical_to_physical.insert(l1, p2);
            self.physical_to_logical.insert(p2, l1);
        } else {
            self.physical_to_logical.remove(&p2);
        }

        if let Some(l2) = l2 {
            self.logical_to_physical.insert(l2, p1);
            self.physical_to_logical.insert(p1, l2);
        } else {
            self.physical_to_logical.remove(&p1);
        }
        self.version += 1;
    }

    /// Apply a sequence of swap operations in order.
    pub fn apply(&mut self, swaps: impl IntoIterator<Item = Swap>) {
        for swap in swaps {
            self.swap(swap.0, swap.1);
        }
    }

    /// Current version token. Bumped on every mutation.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of mapped qubits.
    pub fn len(&self) -> usize {
        self.logical_to_physical.len()
    }

    /// Check whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.logical_to_physical.is_empty()
    }

    /// Iterate over (logical, physical) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, u32)> + '_ {
        self.logical_to_physical.iter().map(|(&l, &p)| (l, p))
    }
}
