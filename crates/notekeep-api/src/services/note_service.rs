//! Note operations.
//!
//! Every operation on a single note runs the ownership guard before anything
//! else touches the store. Input is validated before the guard, so malformed
//! requests are rejected without revealing whether a note exists.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use notekeep_core::{
    authorize, dedup_ids, default_note_color, validation, CreateNoteRequest, Error,
    LabelRepository, LabelSummary, ListNotesRequest, NewNote, Note, NotePatch, NoteRepository,
    NoteView,
    ObjectId, ReorderRequest, Resource, Result, UpdateNoteRequest,
};

#[derive(Clone)]
pub struct NoteService {
    notes: Arc<dyn NoteRepository>,
    labels: Arc<dyn LabelRepository>,
}

impl NoteService {
    pub fn new(notes: Arc<dyn NoteRepository>, labels: Arc<dyn LabelRepository>) -> Self {
        Self { notes, labels }
    }

    /// The caller's notes matching `req`, labels resolved.
    pub async fn list(&self, owner: ObjectId, req: &ListNotesRequest) -> Result<Vec<NoteView>> {
        let notes = self.notes.list(owner, req).await?;
        self.views(owner, notes).await
    }

    pub async fn get(&self, id: ObjectId, owner: ObjectId) -> Result<NoteView> {
        let note = self.guarded(id, owner).await?;
        self.view(note).await
    }

    pub async fn create(&self, owner: ObjectId, req: CreateNoteRequest) -> Result<NoteView> {
        let title = validation::note_title(&req.title)?;
        let description = validation::note_description(&req.description)?;
        let color = match req.color {
            Some(c) => validation::color(&c)?,
            None => default_note_color(),
        };
        let is_archived = req.is_archived.unwrap_or(false);
        let is_pinned = req.is_pinned.unwrap_or(false) && !is_archived;
        let labels = match req.labels {
            Some(ids) => self.owned_labels(owner, &ids).await?,
            None => Vec::new(),
        };

        let note = self
            .notes
            .insert(NewNote {
                id: ObjectId::new(),
                owner,
                title,
                description,
                color,
                is_pinned,
                is_archived,
                labels,
                created_at: Utc::now(),
            })
            .await?;

        info!(
            subsystem = "service",
            component = "notes",
            op = "create",
            note_id = %note.id,
            owner_id = %owner,
            new_order = note.order,
            "Note created"
        );
        self.view(note).await
    }

    /// Apply a partial update. The note's position is never changed here.
    pub async fn update(
        &self,
        id: ObjectId,
        owner: ObjectId,
        req: UpdateNoteRequest,
    ) -> Result<NoteView> {
        let title = req.title.as_deref().map(validation::note_title).transpose()?;
        let description = req
            .description
            .as_deref()
            .map(validation::note_description)
            .transpose()?;
        let color = req.color.as_deref().map(validation::color).transpose()?;

        self.guarded(id, owner).await?;

        let labels = match &req.labels {
            Some(ids) => Some(self.owned_labels(owner, ids).await?),
            None => None,
        };
        let patch = NotePatch {
            title,
            description,
            color,
            is_pinned: req.is_pinned,
            is_archived: req.is_archived,
            labels,
        };

        let note = self.notes.update(id, &patch).await?;
        self.view(note).await
    }

    pub async fn delete(&self, id: ObjectId, owner: ObjectId) -> Result<()> {
        self.guarded(id, owner).await?;
        self.notes.delete(id).await?;
        info!(
            subsystem = "service",
            component = "notes",
            op = "delete",
            note_id = %id,
            owner_id = %owner,
            "Note deleted"
        );
        Ok(())
    }

    /// Move a note within the caller's ordering.
    pub async fn reorder(&self, owner: ObjectId, req: ReorderRequest) -> Result<NoteView> {
        let new_order = validation::new_order(req.new_order)?;
        let current = self.guarded(req.note_id, owner).await?;

        let note = self.notes.reorder(owner, req.note_id, new_order).await?;
        info!(
            subsystem = "service",
            component = "notes",
            op = "reorder",
            note_id = %note.id,
            owner_id = %owner,
            old_order = current.order,
            new_order = note.order,
            "Note reordered"
        );
        self.view(note).await
    }

    pub async fn toggle_pin(&self, id: ObjectId, owner: ObjectId) -> Result<NoteView> {
        self.guarded(id, owner).await?;
        let note = self.notes.toggle_pin(id).await?;
        self.view(note).await
    }

    /// Flip the archive flag; archiving also unpins.
    pub async fn toggle_archive(&self, id: ObjectId, owner: ObjectId) -> Result<NoteView> {
        self.guarded(id, owner).await?;
        let note = self.notes.toggle_archive(id).await?;
        self.view(note).await
    }

    async fn guarded(&self, id: ObjectId, owner: ObjectId) -> Result<Note> {
        let note = self.notes.fetch(id).await?;
        authorize(note, owner, Resource::Note)
    }

    /// Deduplicate `ids` and require every one to be a label of `owner`.
    async fn owned_labels(&self, owner: ObjectId, ids: &[ObjectId]) -> Result<Vec<ObjectId>> {
        let ids = dedup_ids(ids);
        if ids.is_empty() {
            return Ok(ids);
        }
        let found = self.labels.owned_summaries(owner, &ids).await?;
        if found.len() != ids.len() {
            return Err(Error::InvalidLabels);
        }
        Ok(ids)
    }

    async fn view(&self, note: Note) -> Result<NoteView> {
        let resolved = self.labels.owned_summaries(note.owner, &note.labels).await?;
        Ok(NoteView::resolve(note, &resolved))
    }

    /// Resolve labels for many notes with one lookup.
    pub(crate) async fn views(&self, owner: ObjectId, notes: Vec<Note>) -> Result<Vec<NoteView>> {
        let all: Vec<ObjectId> =
            dedup_ids(&notes.iter().flat_map(|n| n.labels.iter().copied()).collect::<Vec<_>>());
        let resolved: Vec<LabelSummary> = if all.is_empty() {
            Vec::new()
        } else {
            self.labels.owned_summaries(owner, &all).await?
        };
        Ok(notes
            .into_iter()
            .map(|n| NoteView::resolve(n, &resolved))
            .collect())
    }
}
