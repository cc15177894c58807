//! Label operations, including bulk attach/detach across notes.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use notekeep_core::{
    authorize, dedup_ids, default_label_color, validation, CreateLabelRequest, Error, Label,
    LabelDetail, LabelRepository, LabelWithCount, ListNotesRequest, ModifiedCount,
    NoteRepository, ObjectId, Resource, Result, UpdateLabelRequest, DUPLICATE_LABEL_MSG,
};

use super::NoteService;

#[derive(Clone)]
pub struct LabelService {
    labels: Arc<dyn LabelRepository>,
    notes: Arc<dyn NoteRepository>,
    note_views: NoteService,
}

impl LabelService {
    pub fn new(labels: Arc<dyn LabelRepository>, notes: Arc<dyn NoteRepository>) -> Self {
        Self {
            note_views: NoteService::new(notes.clone(), labels.clone()),
            labels,
            notes,
        }
    }

    /// The caller's labels, name ascending, with live note counts.
    pub async fn list(&self, owner: ObjectId) -> Result<Vec<LabelWithCount>> {
        self.labels.list_with_counts(owner).await
    }

    /// A label with every note carrying it.
    pub async fn get(&self, id: ObjectId, owner: ObjectId) -> Result<LabelDetail> {
        let label = self.guarded(id, owner).await?;
        let req = ListNotesRequest {
            labels: Some(vec![id]),
            ..Default::default()
        };
        let notes = self.notes.list(owner, &req).await?;
        let notes = self.note_views.views(owner, notes).await?;
        Ok(LabelDetail {
            note_count: notes.len() as i64,
            label,
            notes,
        })
    }

    pub async fn create(&self, owner: ObjectId, req: CreateLabelRequest) -> Result<LabelWithCount> {
        let name = validation::label_name(&req.name)?;
        let color = match req.color {
            Some(c) => validation::color(&c)?,
            None => default_label_color(),
        };

        if self.labels.name_exists(owner, &name, None).await? {
            return Err(Error::Conflict(DUPLICATE_LABEL_MSG.to_string()));
        }

        let label = Label {
            id: ObjectId::new(),
            name,
            color,
            owner,
            created_at: Utc::now(),
        };
        self.labels.insert(&label).await?;

        info!(
            subsystem = "service",
            component = "labels",
            op = "create",
            label_id = %label.id,
            owner_id = %owner,
            "Label created"
        );
        Ok(LabelWithCount {
            label,
            note_count: 0,
        })
    }

    pub async fn update(
        &self,
        id: ObjectId,
        owner: ObjectId,
        req: UpdateLabelRequest,
    ) -> Result<LabelWithCount> {
        let name = req.name.as_deref().map(validation::label_name).transpose()?;
        let color = req.color.as_deref().map(validation::color).transpose()?;

        let mut label = self.guarded(id, owner).await?;

        if let Some(name) = name {
            if name != label.name && self.labels.name_exists(owner, &name, Some(id)).await? {
                return Err(Error::Conflict(DUPLICATE_LABEL_MSG.to_string()));
            }
            label.name = name;
        }
        if let Some(color) = color {
            label.color = color;
        }

        self.labels.update(&label).await?;
        let note_count = self.labels.note_count(id).await?;
        Ok(LabelWithCount { label, note_count })
    }

    /// Delete a label after unlinking it from every note.
    pub async fn delete(&self, id: ObjectId, owner: ObjectId) -> Result<()> {
        self.guarded(id, owner).await?;
        let unlinked = self.labels.delete(id).await?;
        info!(
            subsystem = "service",
            component = "labels",
            op = "delete_cascade",
            label_id = %id,
            owner_id = %owner,
            modified_count = unlinked,
            "Label deleted"
        );
        Ok(())
    }

    /// Attach the label to the listed notes the caller owns. Foreign notes
    /// and notes already carrying the label are skipped silently.
    pub async fn add_to_notes(
        &self,
        id: ObjectId,
        owner: ObjectId,
        note_ids: &[ObjectId],
    ) -> Result<ModifiedCount> {
        validation::note_ids(note_ids)?;
        self.guarded(id, owner).await?;
        let modified_count = self.notes.add_label(owner, id, &dedup_ids(note_ids)).await?;
        Ok(ModifiedCount { modified_count })
    }

    /// Detach the label from the listed notes the caller owns.
    pub async fn remove_from_notes(
        &self,
        id: ObjectId,
        owner: ObjectId,
        note_ids: &[ObjectId],
    ) -> Result<ModifiedCount> {
        validation::note_ids(note_ids)?;
        self.guarded(id, owner).await?;
        let modified_count = self
            .notes
            .remove_label(owner, id, &dedup_ids(note_ids))
            .await?;
        Ok(ModifiedCount { modified_count })
    }

    async fn guarded(&self, id: ObjectId, owner: ObjectId) -> Result<Label> {
        let label = self.labels.fetch(id).await?;
        authorize(label, owner, Resource::Label)
    }
}
