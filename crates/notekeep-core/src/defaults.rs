//! Centralized default constants for notekeep.
//!
//! Field limits, default colors and server defaults live here so the
//! validation rules, the SQL schema and the HTTP layer agree on one value.

// =============================================================================
// LABELS
// =============================================================================

/// Color assigned to a label created without one.
pub const LABEL_COLOR: &str = "#808080";

/// Maximum label name length in characters (after trimming).
pub const LABEL_NAME_MAX_CHARS: usize = 30;

// =============================================================================
// NOTES
// =============================================================================

/// Color assigned to a note created without one.
pub const NOTE_COLOR: &str = "#ffffff";

/// Maximum note title length in characters (after trimming).
pub const NOTE_TITLE_MAX_CHARS: usize = 100;

/// Maximum note description length in characters (after trimming).
pub const NOTE_DESCRIPTION_MAX_CHARS: usize = 1000;

/// Sort applied when a list request does not name one: pinned first, newest first.
pub const NOTE_SORT: &str = "-isPinned,-createdAt";

/// Order assigned to an owner's first note.
pub const FIRST_NOTE_ORDER: i64 = 0;

/// Highest order a note may be moved to or created at.
pub const MAX_NOTE_ORDER: i64 = i32::MAX as i64;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP port.
pub const SERVER_PORT: u16 = 5000;

/// Default bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default allowed CORS origin (local web client).
pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Maximum accepted request body in bytes.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default database URL.
pub const DATABASE_URL: &str = "postgres://localhost/notekeep";
