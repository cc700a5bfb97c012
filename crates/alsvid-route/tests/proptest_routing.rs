//! Property-based tests for swap-round planning.
//!
//! Random connected topologies (a line spine plus random chords) and random
//! requirement batches, checking the invariants that must hold for every
//! round: parallel safety, qubit conservation, routed-pair adjacency and
//! reproducibility.

use std::sync::Arc;

use alsvid_graph::Topology;
use alsvid_route::{Mapping, PathManager, QubitId};
use proptest::prelude::*;

/// Generate a connected topology of 4..=12 nodes together with a batch of
/// 1..=5 requirements over those nodes.
fn arb_case() -> impl Strategy<Value = (Topology, Vec<(QubitId, QubitId)>)> {
    (4u32..=12).prop_flat_map(|n| {
        let chords = prop::collection::vec((0..n, 0..n), 0..6);
        let requirements = prop::collection::vec((0..n, 0..n), 1..=5);
        (chords, requirements).prop_map(move |(chords, requirements)| {
            // A line spine keeps the graph connected; chords add shortcuts.
            let mut edges: Vec<(u32, u32)> = (0..n - 1).map(|i| (i, i + 1)).collect();
            edges.extend(chords);
            let topology = Topology::from_edges(n, edges).expect("nodes are in range");
            let requirements = requirements
                .into_iter()
                .map(|(a, b)| (QubitId(a), QubitId(b)))
                .collect();
            (topology, requirements)
        })
    })
}

proptest! {
    #[test]
    fn prop_groups_are_parallel_safe((topology, requirements) in arb_case()) {
        let n = topology.num_nodes();
        let mut manager = PathManager::new(Arc::new(topology));
        let report = manager.resolve(&requirements, &Mapping::trivial(n)).unwrap();

        for group in &report.groups {
            let mut nodes = std::collections::HashSet::new();
            for swap in group.iter() {
                prop_assert!(nodes.insert(swap.0));
                prop_assert!(nodes.insert(swap.1));
            }
        }
    }

    #[test]
    fn prop_qubits_are_conserved((topology, requirements) in arb_case()) {
        let n = topology.num_nodes();
        let mut manager = PathManager::new(Arc::new(topology));
        let mut mapping = Mapping::trivial(n);
        let report = manager.resolve(&requirements, &mapping).unwrap();

        for group in &report.groups {
            mapping.apply(group.iter().copied());
        }
        prop_assert_eq!(mapping.len(), n as usize);
        let mut seen = std::collections::HashSet::new();
        for (_, p) in mapping.iter() {
            prop_assert!(seen.insert(p), "two qubits collided on node {}", p);
        }
    }

    #[test]
    fn prop_routed_pairs_end_adjacent((topology, requirements) in arb_case()) {
        let n = topology.num_nodes();
        let topology = Arc::new(topology);
        let mut manager = PathManager::new(topology.clone());
        let mut mapping = Mapping::trivial(n);
        let report = manager.resolve(&requirements, &mapping).unwrap();

        // Ready pairs are adjacent before any swap.
        for key in &report.ready {
            let pa = mapping.physical(key.a).unwrap();
            let pb = mapping.physical(key.b).unwrap();
            prop_assert!(topology.has_edge(pa, pb));
        }

        for group in &report.groups {
            mapping.apply(group.iter().copied());
        }
        for key in &report.routed {
            let pa = mapping.physical(key.a).unwrap();
            let pb = mapping.physical(key.b).unwrap();
            prop_assert!(
                topology.has_edge(pa, pb),
                "{} not adjacent after round: {} vs {}", key, pa, pb
            );
        }
    }

    #[test]
    fn prop_resolve_is_reproducible((topology, requirements) in arb_case()) {
        let n = topology.num_nodes();
        let mapping = Mapping::trivial(n);

        let mut first = PathManager::new(Arc::new(topology.clone()));
        let mut second = PathManager::new(Arc::new(topology));
        let a = first.resolve(&requirements, &mapping).unwrap();
        let b = second.resolve(&requirements, &mapping).unwrap();

        prop_assert_eq!(a.groups, b.groups);
        prop_assert_eq!(a.ready, b.ready);
        prop_assert_eq!(a.routed, b.routed);
        prop_assert_eq!(a.deferred, b.deferred);
    }

    #[test]
    fn prop_every_requirement_lands_in_one_bucket((topology, requirements) in arb_case()) {
        let n = topology.num_nodes();
        let mut manager = PathManager::new(Arc::new(topology));
        let report = manager.resolve(&requirements, &Mapping::trivial(n)).unwrap();

        let mut keys: Vec<_> = requirements
            .iter()
            .filter(|(a, b)| a != b)
            .map(|&(a, b)| alsvid_route::InteractionKey::new(a, b))
            .collect();
        keys.sort();
        keys.dedup();

        let mut buckets: Vec<_> = report
            .ready
            .iter()
            .chain(&report.routed)
            .chain(&report.deferred)
            .chain(&report.disconnected)
            .chain(&report.unmapped)
            .copied()
            .collect();
        buckets.sort();
        prop_assert_eq!(buckets, keys);
    }
}
