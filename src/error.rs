//! Error types for heap and routing operations

use std::fmt;

use crate::routing::VertexId;

/// Error type for heap operations
///
/// The heap performs no validation beyond linkage checks: a misordered key
/// or a handle from a foreign store is a caller error, not a reported one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// The node is already linked into this heap
    AlreadyLinked,
    /// The node is not linked into this heap
    NotLinked,
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::AlreadyLinked => write!(f, "node is already linked into the heap"),
            HeapError::NotLinked => write!(f, "node is not linked into the heap"),
        }
    }
}

impl std::error::Error for HeapError {}

/// Error type for topology changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingError {
    /// The vertex id is out of range
    UnknownVertex(VertexId),
    /// No edge exists from `tail` to `head`
    UnknownEdge { tail: VertexId, head: VertexId },
    /// Edges from a vertex to itself are rejected
    SelfLoop(VertexId),
    /// Edge costs must be positive
    ZeroCost { tail: VertexId, head: VertexId },
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::UnknownVertex(v) => write!(f, "unknown vertex {}", v),
            RoutingError::UnknownEdge { tail, head } => {
                write!(f, "no edge from vertex {} to vertex {}", tail, head)
            }
            RoutingError::SelfLoop(v) => write!(f, "self-loop on vertex {}", v),
            RoutingError::ZeroCost { tail, head } => {
                write!(f, "edge from vertex {} to vertex {} has zero cost", tail, head)
            }
        }
    }
}

impl std::error::Error for RoutingError {}
