//! Physical qubit connectivity topology.
//!
//! This crate models the static coupling graph of a quantum device: which
//! pairs of physical qubit sites can host a two-qubit gate. The graph is
//! immutable after construction and every query is deterministic, so the
//! same topology can be shared (e.g. behind an `Arc`) by any number of
//! routing rounds running in different contexts.
//!
//! All path queries break ties lexicographically: among equally short
//! paths, [`Topology::shortest_path`] always returns the one whose node
//! sequence compares smallest. This is what makes the routing layer built
//! on top of this crate reproducible run to run.

pub mod error;
pub mod topology;

pub use error::{GraphError, GraphResult};
pub use topology::Topology;
