//! In-memory store.
//!
//! Implements both repository traits over maps behind one async `RwLock`.
//! Every mutating method holds the write lock for its whole duration, which
//! gives the same atomicity the PostgreSQL repositories get from
//! transactions and advisory locks. Used by the test suites and by the server
//! when `STORE=memory`.
//!
//! Search matches whole lowercase words; PostgreSQL additionally applies
//! English stemming.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use notekeep_core::{
    next_order, Error, Label, LabelRepository, LabelSummary, LabelWithCount, ListNotesRequest,
    NewNote, Note, NotePatch, NoteRepository, ObjectId, ReorderPlan, Result, DUPLICATE_LABEL_MSG,
};

#[derive(Debug, Default)]
struct State {
    notes: BTreeMap<ObjectId, Note>,
    labels: BTreeMap<ObjectId, Label>,
}

impl State {
    fn name_taken(&self, owner: ObjectId, name: &str, exclude: Option<ObjectId>) -> bool {
        self.labels
            .values()
            .any(|l| l.owner == owner && l.name == name && Some(l.id) != exclude)
    }

    fn check_labels_exist(&self, labels: &[ObjectId]) -> Result<()> {
        if labels.iter().all(|id| self.labels.contains_key(id)) {
            Ok(())
        } else {
            Err(Error::InvalidLabels)
        }
    }

    /// Change one note in place and refresh its `updated_at`.
    fn modify_note(&mut self, id: ObjectId, change: impl FnOnce(&mut Note)) -> Result<Note> {
        let note = self
            .notes
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Note not found".to_string()))?;
        change(note);
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    fn note_count(&self, label_id: ObjectId) -> i64 {
        self.notes.values().filter(|n| n.has_label(label_id)).count() as i64
    }
}

/// Shared in-memory note and label store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notes across all owners.
    pub async fn note_total(&self) -> usize {
        self.state.read().await.notes.len()
    }

    /// Number of labels across all owners.
    pub async fn label_total(&self) -> usize {
        self.state.read().await.labels.len()
    }
}

#[async_trait]
impl LabelRepository for MemoryStore {
    async fn fetch(&self, id: ObjectId) -> Result<Option<Label>> {
        Ok(self.state.read().await.labels.get(&id).cloned())
    }

    async fn list_with_counts(&self, owner: ObjectId) -> Result<Vec<LabelWithCount>> {
        let state = self.state.read().await;
        let mut labels: Vec<LabelWithCount> = state
            .labels
            .values()
            .filter(|l| l.owner == owner)
            .map(|l| LabelWithCount {
                label: l.clone(),
                note_count: state.note_count(l.id),
            })
            .collect();
        labels.sort_by(|a, b| {
            a.label
                .name
                .cmp(&b.label.name)
                .then_with(|| a.label.id.cmp(&b.label.id))
        });
        Ok(labels)
    }

    async fn name_exists(
        &self,
        owner: ObjectId,
        name: &str,
        exclude: Option<ObjectId>,
    ) -> Result<bool> {
        Ok(self.state.read().await.name_taken(owner, name, exclude))
    }

    async fn owned_summaries(&self, owner: ObjectId, ids: &[ObjectId]) -> Result<Vec<LabelSummary>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.labels.get(id))
            .filter(|l| l.owner == owner)
            .map(LabelSummary::from)
            .collect())
    }

    async fn insert(&self, label: &Label) -> Result<()> {
        let mut state = self.state.write().await;
        if state.name_taken(label.owner, &label.name, None) {
            return Err(Error::Conflict(DUPLICATE_LABEL_MSG.to_string()));
        }
        state.labels.insert(label.id, label.clone());
        Ok(())
    }

    async fn update(&self, label: &Label) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.labels.contains_key(&label.id) {
            return Err(Error::NotFound("Label not found".to_string()));
        }
        if state.name_taken(label.owner, &label.name, Some(label.id)) {
            return Err(Error::Conflict(DUPLICATE_LABEL_MSG.to_string()));
        }
        if let Some(stored) = state.labels.get_mut(&label.id) {
            stored.name = label.name.clone();
            stored.color = label.color.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> Result<u64> {
        let mut state = self.state.write().await;
        if state.labels.remove(&id).is_none() {
            return Err(Error::NotFound("Label not found".to_string()));
        }
        let now = Utc::now();
        let mut unlinked = 0;
        for note in state.notes.values_mut() {
            if note.has_label(id) {
                note.labels.retain(|l| *l != id);
                note.updated_at = now;
                unlinked += 1;
            }
        }
        info!(
            subsystem = "db",
            component = "memory_store",
            op = "delete_cascade",
            label_id = %id,
            modified_count = unlinked,
            "Deleted label"
        );
        Ok(unlinked)
    }

    async fn note_count(&self, id: ObjectId) -> Result<i64> {
        Ok(self.state.read().await.note_count(id))
    }
}

#[async_trait]
impl NoteRepository for MemoryStore {
    async fn fetch(&self, id: ObjectId) -> Result<Option<Note>> {
        Ok(self.state.read().await.notes.get(&id).cloned())
    }

    async fn list(&self, owner: ObjectId, req: &ListNotesRequest) -> Result<Vec<Note>> {
        let state = self.state.read().await;
        let mut notes: Vec<Note> = state
            .notes
            .values()
            .filter(|n| n.owner == owner && req.matches(n))
            .cloned()
            .collect();
        notes.sort_by(|a, b| req.compare(a, b));
        debug!(
            subsystem = "db",
            component = "memory_store",
            op = "list",
            owner_id = %owner,
            result_count = notes.len(),
            "Listed notes"
        );
        Ok(notes)
    }

    async fn insert(&self, note: NewNote) -> Result<Note> {
        let mut state = self.state.write().await;
        state.check_labels_exist(&note.labels)?;
        let current_max = state
            .notes
            .values()
            .filter(|n| n.owner == note.owner)
            .map(|n| n.order)
            .max();
        let note = note.into_note(next_order(current_max)?);
        state.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update(&self, id: ObjectId, patch: &NotePatch) -> Result<Note> {
        let mut state = self.state.write().await;
        if let Some(labels) = &patch.labels {
            state.check_labels_exist(labels)?;
        }
        state.modify_note(id, |note| patch.apply_to(note))
    }

    async fn toggle_pin(&self, id: ObjectId) -> Result<Note> {
        self.state.write().await.modify_note(id, Note::toggle_pin)
    }

    async fn toggle_archive(&self, id: ObjectId) -> Result<Note> {
        self.state.write().await.modify_note(id, Note::toggle_archive)
    }

    async fn delete(&self, id: ObjectId) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .notes
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound("Note not found".to_string()))
    }

    async fn reorder(&self, owner: ObjectId, id: ObjectId, new_order: i64) -> Result<Note> {
        let mut state = self.state.write().await;
        let old_order = state
            .notes
            .get(&id)
            .filter(|n| n.owner == owner)
            .map(|n| n.order)
            .ok_or_else(|| Error::NotFound("Note not found".to_string()))?;

        let plan = ReorderPlan::new(old_order, new_order);
        if !plan.is_noop() {
            let now = Utc::now();
            for note in state.notes.values_mut() {
                if note.owner != owner {
                    continue;
                }
                if note.id == id {
                    note.order = plan.new_order;
                    note.updated_at = now;
                } else {
                    let shifted = plan.shifted(note.order);
                    if shifted != note.order {
                        note.order = shifted;
                        note.updated_at = now;
                    }
                }
            }
        }

        state
            .notes
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Note not found".to_string()))
    }

    async fn add_label(
        &self,
        owner: ObjectId,
        label_id: ObjectId,
        note_ids: &[ObjectId],
    ) -> Result<u64> {
        let mut state = self.state.write().await;
        state.check_labels_exist(&[label_id])?;
        let now = Utc::now();
        let mut modified = 0;
        for id in note_ids {
            if let Some(note) = state.notes.get_mut(id) {
                if note.owner == owner && !note.has_label(label_id) {
                    note.labels.push(label_id);
                    note.updated_at = now;
                    modified += 1;
                }
            }
        }
        Ok(modified)
    }

    async fn remove_label(
        &self,
        owner: ObjectId,
        label_id: ObjectId,
        note_ids: &[ObjectId],
    ) -> Result<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut modified = 0;
        for id in note_ids {
            if let Some(note) = state.notes.get_mut(id) {
                if note.owner == owner && note.has_label(label_id) {
                    note.labels.retain(|l| *l != label_id);
                    note.updated_at = now;
                    modified += 1;
                }
            }
        }
        Ok(modified)
    }
}
