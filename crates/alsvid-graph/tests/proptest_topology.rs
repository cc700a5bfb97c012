//! Property-based tests for topology path queries.

use alsvid_graph::Topology;
use proptest::prelude::*;

/// A connected topology: a line spine over `4..=14` nodes plus random
/// chords, with a random query pair.
fn arb_topology_and_pair() -> impl Strategy<Value = (Topology, u32, u32)> {
    (4u32..=14).prop_flat_map(|n| {
        let chords = prop::collection::vec((0..n, 0..n), 0..8);
        (chords, 0..n, 0..n).prop_map(move |(chords, a, b)| {
            let mut edges: Vec<(u32, u32)> = (0..n - 1).map(|i| (i, i + 1)).collect();
            edges.extend(chords);
            let topology = Topology::from_edges(n, edges).expect("nodes are in range");
            (topology, a, b)
        })
    })
}

proptest! {
    #[test]
    fn prop_shortest_path_matches_distance((topology, a, b) in arb_topology_and_pair()) {
        let distance = topology.distance(a, b).unwrap();
        let path = topology.shortest_path(a, b).unwrap();
        prop_assert_eq!(path.len() as u32, distance + 1);
        prop_assert_eq!(path[0], a);
        prop_assert_eq!(*path.last().unwrap(), b);
        for window in path.windows(2) {
            prop_assert!(topology.has_edge(window[0], window[1]));
        }
    }

    #[test]
    fn prop_all_shortest_paths_are_shortest((topology, a, b) in arb_topology_and_pair()) {
        let distance = topology.distance(a, b).unwrap();
        let all = topology.all_shortest_paths(a, b).unwrap();
        prop_assert!(!all.is_empty());
        // First entry is the canonical path, order is lexicographic.
        prop_assert_eq!(&all[0], &topology.shortest_path(a, b).unwrap());
        let mut sorted = all.clone();
        sorted.sort();
        prop_assert_eq!(&all, &sorted);
        for path in &all {
            prop_assert_eq!(path.len() as u32, distance + 1);
        }
    }

    #[test]
    fn prop_queries_are_deterministic((topology, a, b) in arb_topology_and_pair()) {
        prop_assert_eq!(
            topology.shortest_path(a, b).unwrap(),
            topology.shortest_path(a, b).unwrap()
        );
        prop_assert_eq!(
            topology.all_shortest_paths(a, b).unwrap(),
            topology.all_shortest_paths(a, b).unwrap()
        );
    }
}
