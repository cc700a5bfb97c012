//! Swap routing for qubit mapping.
//!
//! Given a static connectivity [`Topology`](alsvid_graph::Topology), a
//! logical-to-physical [`Mapping`] and a batch of two-qubit interaction
//! requirements, this crate computes the swap operations that bring each
//! interacting pair onto adjacent physical nodes, and packs those swaps
//! into time-ordered groups that can execute in parallel.
//!
//! # Pipeline
//!
//! ```text
//! requirements + mapping
//!       │
//!       ▼
//! ┌─────────────┐   shortest / alternate paths   ┌───────────────┐
//! │ PathManager │ ◄────────────────────────────── │ Topology      │
//! └─────────────┘                                 └───────────────┘
//!       │ candidate paths
//!       ▼
//! ┌───────────────┐  crossings / intersections  ┌────────────────┐
//! │ PathContainer │ ───────────────────────────► │ split shifting │
//! └───────────────┘     (defer on conflict)      └────────────────┘
//!       │ accepted split paths
//!       ▼
//! parallel swap groups (RoundReport)
//! ```
//!
//! Each accepted path is split into two halves around its midpoint so the
//! two endpoint qubits travel inward simultaneously; a path of `k` edges
//! needs `k - 1` swaps but only about `k / 2` time steps. Paths that share
//! a node (a *crossing*) are tolerated as long as the shared node is not a
//! split boundary; a crossing that lands on a boundary (an *intersection*)
//! is resolved by shifting the split, reordering path priorities, or as a
//! last resort deferring the lower-priority requirement to a later round.
//!
//! The whole computation is synchronous, deterministic and free of I/O.
//! "Parallel" swap groups are a scheduling output: swaps within one group
//! touch disjoint nodes and may be issued simultaneously by the consumer.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use alsvid_graph::Topology;
//! use alsvid_route::{Mapping, PathManager, QubitId};
//!
//! let topology = Arc::new(Topology::linear(5));
//! let mut manager = PathManager::new(topology);
//! let mapping = Mapping::trivial(5);
//!
//! let report = manager
//!     .resolve(&[(QubitId(0), QubitId(4))], &mapping)
//!     .unwrap();
//!
//! // Two parallel steps: {(0,1),(3,4)} then {(2,3)}.
//! assert_eq!(report.groups.len(), 2);
//! assert_eq!(report.num_swaps(), 3);
//! ```

pub mod cache;
pub mod container;
pub mod crossing;
pub mod error;
pub mod manager;
pub mod mapping;
pub mod path;
pub mod schedule;

pub use cache::{CacheStats, ExhaustiveCache, PathCache};
pub use container::{AddOutcome, PathContainer, PathId};
pub use crossing::{Conflict, CrossingRec};
pub use error::{RouteError, RouteResult};
pub use manager::{PathManager, RoundReport};
pub use mapping::{Mapping, QubitId};
pub use path::{InteractionKey, PairKey, SplitPath, Swap, SwapGroup};
