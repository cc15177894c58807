//! Service layer for business logic.

pub mod label_service;
pub mod note_service;

pub use label_service::LabelService;
pub use note_service::NoteService;
