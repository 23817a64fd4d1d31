//! Blueprint-validation errors.

use thiserror::Error;

/// Errors raised while validating a [`crate::Blueprint`] before it is
/// indexed, persisted, or run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// Two or more nodes share the same ID.
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// An edge references a node ID that doesn't exist in the blueprint.
    #[error("edge references unknown node '{node_id}' ({side} side)")]
    UnknownNodeReference {
        node_id: String,
        side: &'static str,
    },

    /// A node's `uses` key has no matching entry in the implementation
    /// registry supplied at validation time.
    #[error("node '{node_id}' uses unknown implementation '{uses}'")]
    UnknownImplementation { node_id: String, uses: String },
}
