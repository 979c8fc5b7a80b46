//! Error types for Project Tactics.

use thiserror::Error;

use crate::ids::EntityId;

/// Top-level error type for Tactics operations.
#[derive(Debug, Error)]
pub enum TacticsError {
    /// Entity does not exist in the arena
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// A tunable failed validation
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfig {
        /// Offending field
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TacticsError {
    /// Shorthand for an [`TacticsError::InvalidConfig`].
    #[must_use]
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for Tactics operations.
pub type TacticsResult<T> = Result<T, TacticsError>;
