//! Field validation shared by the services and the HTTP layer.
//!
//! Each validator returns the normalized value (trimmed text) or
//! `Error::InvalidInput` with a message suitable for API clients.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::{
    LABEL_NAME_MAX_CHARS, MAX_NOTE_ORDER, NOTE_DESCRIPTION_MAX_CHARS, NOTE_TITLE_MAX_CHARS,
};
use crate::error::{Error, Result};
use crate::object_id::ObjectId;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").expect("valid color regex"));

/// Check a `#RGB` / `#RRGGBB` color.
pub fn color(value: &str) -> Result<String> {
    if HEX_COLOR.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(Error::InvalidInput(
            "Please provide a valid hex color".to_string(),
        ))
    }
}

fn bounded_text(value: &str, field: &str, max_chars: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    if trimmed.chars().count() > max_chars {
        return Err(Error::InvalidInput(format!(
            "{} cannot exceed {} characters",
            field, max_chars
        )));
    }
    Ok(trimmed.to_string())
}

/// Trimmed label name, 1 to 30 characters.
pub fn label_name(value: &str) -> Result<String> {
    bounded_text(value, "Label name", LABEL_NAME_MAX_CHARS)
}

/// Trimmed note title, 1 to 100 characters.
pub fn note_title(value: &str) -> Result<String> {
    bounded_text(value, "Title", NOTE_TITLE_MAX_CHARS)
}

/// Trimmed note description, 1 to 1000 characters.
pub fn note_description(value: &str) -> Result<String> {
    bounded_text(value, "Description", NOTE_DESCRIPTION_MAX_CHARS)
}

/// Target position for a reorder.
pub fn new_order(value: i64) -> Result<i64> {
    if value < 0 {
        return Err(Error::InvalidInput(
            "Order must be a positive integer".to_string(),
        ));
    }
    if value > MAX_NOTE_ORDER {
        return Err(Error::InvalidInput(format!(
            "Order cannot exceed {}",
            MAX_NOTE_ORDER
        )));
    }
    Ok(value)
}

/// Note id list for bulk attach/detach.
pub fn note_ids(ids: &[ObjectId]) -> Result<()> {
    if ids.is_empty() {
        return Err(Error::InvalidInput(
            "Note IDs array cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Parse a boolean query flag. Only the literals `true` and `false` are accepted.
pub fn bool_flag(value: &str, field: &str) -> Result<bool> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::InvalidInput(format!(
            "{} must be true or false",
            field
        ))),
    }
}
