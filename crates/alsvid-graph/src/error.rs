//! Error types for topology queries.

use thiserror::Error;

/// Errors raised by [`Topology`](crate::Topology) queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A query referenced a node outside the topology.
    #[error("node {0} is not part of the topology")]
    UnknownNode(u32),

    /// The two nodes lie in different connected components, so no path
    /// between them exists.
    #[error("nodes {a} and {b} lie in different connected components")]
    Disconnected { a: u32, b: u32 },

    /// An edge referenced a node outside the declared node range.
    #[error("edge ({a}, {b}) references a node >= {num_nodes}")]
    EdgeOutOfRange { a: u32, b: u32, num_nodes: u32 },
}

/// Result type for topology operations.
pub type GraphResult<T> = Result<T, GraphError>;
