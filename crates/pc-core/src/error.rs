//! Error types for the canvas engine.
//!
//! Operations that reference stale ids inside a list filter them out
//! instead of failing; these errors are reserved for calls where the whole
//! operation has nothing meaningful left to do.

use crate::id::ElementId;
use thiserror::Error;

/// Canvas engine error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The id does not resolve to an element or component definition.
    #[error("not found: {0}")]
    NotFound(ElementId),

    /// The requested parent is missing, not a container, or would make the
    /// element its own ancestor.
    #[error("invalid parent {parent} for {child}: {reason}")]
    InvalidParent {
        /// Element being placed.
        child: ElementId,
        /// Requested parent.
        parent: ElementId,
        /// Why the parent was rejected.
        reason: &'static str,
    },

    /// A payload or patch failed variant-specific field requirements.
    #[error("validation error: {0}")]
    Validation(String),

    /// An operation that needs at least one resolved element got none.
    #[error("empty selection: {0}")]
    EmptySelection(&'static str),
}

impl EngineError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Validation(err.to_string())
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;
