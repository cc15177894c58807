//! Shared application state.

use std::sync::Arc;

use notekeep_core::{LabelRepository, NoteRepository};
use notekeep_db::{Database, MemoryStore};

use crate::auth::JwtVerifier;
use crate::services::{LabelService, NoteService};

#[derive(Clone)]
pub struct AppState {
    pub notes: NoteService,
    pub labels: LabelService,
    pub verifier: JwtVerifier,
}

impl AppState {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        labels: Arc<dyn LabelRepository>,
        verifier: JwtVerifier,
    ) -> Self {
        Self {
            notes: NoteService::new(notes.clone(), labels.clone()),
            labels: LabelService::new(labels, notes),
            verifier,
        }
    }

    /// State backed by PostgreSQL.
    pub fn with_database(db: &Database, verifier: JwtVerifier) -> Self {
        Self::new(db.notes.clone(), db.labels.clone(), verifier)
    }

    /// State backed by an in-memory store.
    pub fn with_memory_store(store: MemoryStore, verifier: JwtVerifier) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store, verifier)
    }
}
