//! Error types for notekeep.

use thiserror::Error;

/// Message for a duplicate `(owner, name)` label.
pub const DUPLICATE_LABEL_MSG: &str = "Label with this name already exists";

/// Result type alias using notekeep's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notekeep operations.
///
/// Every service operation either succeeds or returns exactly one of these.
/// `InvalidInput`, `InvalidLabels`, `NotFound`, `Unauthorized` and `Conflict`
/// are raised before any write happens.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Record absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record exists but belongs to another owner
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Uniqueness violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// One or more referenced labels do not resolve to the caller's labels
    #[error("Invalid labels")]
    InvalidLabels,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
