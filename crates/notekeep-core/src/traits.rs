//! Core traits for notekeep abstractions.
//!
//! Repositories never apply the ownership guard themselves: services fetch a
//! record, run [`crate::guard::authorize`], then call the mutating method.
//! Methods that touch other records of the same owner (insert, reorder,
//! attach/detach, label delete) are atomic. No method writes back a record a
//! service fetched earlier: each changes only the fields it names.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;
use crate::object_id::ObjectId;
use crate::query::ListNotesRequest;

// =============================================================================
// LABEL REPOSITORY
// =============================================================================

/// Repository for label storage.
#[async_trait]
pub trait LabelRepository: Send + Sync {
    /// Fetch a label by id regardless of owner.
    async fn fetch(&self, id: ObjectId) -> Result<Option<Label>>;

    /// All labels of `owner`, name ascending, with live note counts.
    async fn list_with_counts(&self, owner: ObjectId) -> Result<Vec<LabelWithCount>>;

    /// True if `owner` already has a label called `name` (other than `exclude`).
    async fn name_exists(
        &self,
        owner: ObjectId,
        name: &str,
        exclude: Option<ObjectId>,
    ) -> Result<bool>;

    /// The subset of `ids` that are labels of `owner`, in `ids` order.
    async fn owned_summaries(&self, owner: ObjectId, ids: &[ObjectId]) -> Result<Vec<LabelSummary>>;

    /// Persist a new label. Duplicate `(owner, name)` is `Error::Conflict`.
    async fn insert(&self, label: &Label) -> Result<()>;

    /// Overwrite name and color. Duplicate `(owner, name)` is `Error::Conflict`.
    async fn update(&self, label: &Label) -> Result<()>;

    /// Unlink the label from every note (bumping their `updated_at`), then
    /// delete it. Returns the number of notes unlinked.
    async fn delete(&self, id: ObjectId) -> Result<u64>;

    /// Number of notes carrying the label.
    async fn note_count(&self, id: ObjectId) -> Result<i64>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Repository for note storage.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Fetch a note by id regardless of owner.
    async fn fetch(&self, id: ObjectId) -> Result<Option<Note>>;

    /// Notes of `owner` matching the request, in the requested order.
    async fn list(&self, owner: ObjectId, req: &ListNotesRequest) -> Result<Vec<Note>>;

    /// Insert a note at the end of its owner's ordering.
    async fn insert(&self, note: NewNote) -> Result<Note>;

    /// Apply `patch` in one atomic write, refreshing `updated_at`. Labels are
    /// only rewritten when the patch carries them. Returns the stored note.
    async fn update(&self, id: ObjectId, patch: &NotePatch) -> Result<Note>;

    /// Flip `is_pinned` in place.
    async fn toggle_pin(&self, id: ObjectId) -> Result<Note>;

    /// Flip `is_archived` in place; an archived result is unpinned.
    async fn toggle_archive(&self, id: ObjectId) -> Result<Note>;

    /// Hard delete.
    async fn delete(&self, id: ObjectId) -> Result<()>;

    /// Move a note of `owner` to `new_order`, shifting the notes in between.
    async fn reorder(&self, owner: ObjectId, id: ObjectId, new_order: i64) -> Result<Note>;

    /// Attach `label_id` to those `note_ids` owned by `owner` that lack it.
    /// Returns how many notes changed.
    async fn add_label(&self, owner: ObjectId, label_id: ObjectId, note_ids: &[ObjectId])
        -> Result<u64>;

    /// Detach `label_id` from those `note_ids` owned by `owner` that carry it.
    /// Returns how many notes changed.
    async fn remove_label(
        &self,
        owner: ObjectId,
        label_id: ObjectId,
        note_ids: &[ObjectId],
    ) -> Result<u64>;
}
