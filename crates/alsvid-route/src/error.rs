//! Error types for the routing crate.

use thiserror::Error;

use crate::container::PathId;

/// Errors raised while resolving a routing round.
///
/// Per-requirement conditions (a disconnected pair, an unmapped qubit, a
/// deferred conflict) are not errors: they drop the single requirement and
/// are reported as data in [`RoundReport`](crate::RoundReport). The variants
/// here abort the whole round.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A topology query failed.
    #[error("graph error: {0}")]
    Graph(#[from] alsvid_graph::GraphError),

    /// An accepted path violated a split invariant. This indicates a bug in
    /// the detector or resolver, never a recoverable input condition.
    #[error("path {path_id} split is invalid: {detail}")]
    InvalidSplit { path_id: PathId, detail: String },

    /// The path container reached an inconsistent state (e.g. a crossing
    /// record referencing a path that is no longer held).
    #[error("path container is corrupt: {0}")]
    CorruptContainer(String),
}

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;
