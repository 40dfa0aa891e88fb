//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent hierarchy invariant violations.
/// These are independent of storage and transport concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node {node} cannot be its own parent")]
    SelfParent { node: String },

    #[error("moving {node} under {parent} would create a circular reference")]
    CircularReference { node: String, parent: String },

    #[error("node {node} references missing parent {parent}")]
    DanglingParent { node: String, parent: String },

    #[error("cycle detected in hierarchy: {0} is unreachable from any root")]
    CycleDetected(String),

    #[error("duplicate node id: {0}")]
    DuplicateNode(String),
}
