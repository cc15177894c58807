//! # notekeep-core
//!
//! Core types, traits, and domain rules for notekeep.
//!
//! This crate holds what every other notekeep crate agrees on: identifiers,
//! the note/label model, the ownership guard, the reorder plan, the list query
//! model and the repository traits the stores implement.

pub mod defaults;
pub mod error;
pub mod guard;
pub mod models;
pub mod object_id;
pub mod ordering;
pub mod query;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{Error, Result, DUPLICATE_LABEL_MSG};
pub use guard::{authorize, Owned, Resource};
pub use models::*;
pub use object_id::{ObjectId, ParseObjectIdError};
pub use ordering::{next_order, ReorderPlan, Shift};
pub use query::{
    default_sort, parse_sort, search_terms, ListNotesParams, ListNotesRequest, SortField, SortKey,
};
pub use traits::*;
