//! Domain-level error type.

/// Errors produced by domain operations, independent of any transport.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup came up empty.
    #[error("{entity} with id {id} not found")]
    NotFound {
        entity: &'static str,
        id: crate::types::DbId,
    },

    /// Input failed domain validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness or state conflict.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}
