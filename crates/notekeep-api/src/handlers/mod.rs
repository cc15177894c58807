//! HTTP handlers.

pub mod health;
pub mod labels;
pub mod notes;

use notekeep_core::ObjectId;

use crate::error::ApiError;

/// Parse a `:id` path segment naming a note.
pub(crate) fn note_id(raw: &str) -> Result<ObjectId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid note ID".to_string()))
}

/// Parse a `:id` path segment naming a label.
pub(crate) fn label_id(raw: &str) -> Result<ObjectId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid label ID".to_string()))
}
