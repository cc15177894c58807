//! Domain models for notes and labels.
//!
//! JSON field names are camelCase to match the public API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::object_id::ObjectId;

// =============================================================================
// LABEL TYPES
// =============================================================================

/// A named, colored tag owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: ObjectId,
    pub name: String,
    pub color: String,
    pub owner: ObjectId,
    pub created_at: DateTime<Utc>,
}

/// A label with the live number of notes referencing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelWithCount {
    #[serde(flatten)]
    pub label: Label,
    /// Number of the owner's notes carrying this label (computed)
    pub note_count: i64,
}

/// The slice of a label embedded in a note view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSummary {
    pub id: ObjectId,
    pub name: String,
    pub color: String,
}

impl From<&Label> for LabelSummary {
    fn from(label: &Label) -> Self {
        Self {
            id: label.id,
            name: label.name.clone(),
            color: label.color.clone(),
        }
    }
}

/// A label together with every note referencing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDetail {
    pub label: Label,
    pub notes: Vec<NoteView>,
    pub note_count: i64,
}

/// Request for creating a label.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelRequest {
    pub name: String,
    pub color: Option<String>,
}

/// Partial update of a label.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLabelRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A note as persisted: labels are referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub color: String,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub labels: Vec<ObjectId>,
    pub owner: ObjectId,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Flip the archive flag. Archiving always unpins.
    pub fn toggle_archive(&mut self) {
        self.is_archived = !self.is_archived;
        if self.is_archived {
            self.is_pinned = false;
        }
    }

    /// Flip the pin flag. The archive flag is left alone.
    pub fn toggle_pin(&mut self) {
        self.is_pinned = !self.is_pinned;
    }

    /// True if the note carries `label_id`.
    pub fn has_label(&self, label_id: ObjectId) -> bool {
        self.labels.contains(&label_id)
    }
}

/// A note with its labels resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub color: String,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub labels: Vec<LabelSummary>,
    pub owner: ObjectId,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NoteView {
    /// Build a view, keeping only labels present in `resolved` and preserving
    /// the note's label order.
    pub fn resolve(note: Note, resolved: &[LabelSummary]) -> Self {
        let labels = note
            .labels
            .iter()
            .filter_map(|id| resolved.iter().find(|l| l.id == *id).cloned())
            .collect();
        Self {
            id: note.id,
            title: note.title,
            description: note.description,
            color: note.color,
            is_pinned: note.is_pinned,
            is_archived: note.is_archived,
            labels,
            owner: note.owner,
            order: note.order,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Validated changes to a note. `None` leaves the stored value alone, so a
/// patch never overwrites fields it does not name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    /// Replacement label set, in attach order.
    pub labels: Option<Vec<ObjectId>>,
}

impl NotePatch {
    /// Apply the patch to `note`. An archived result is always unpinned.
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(description) = &self.description {
            note.description = description.clone();
        }
        if let Some(color) = &self.color {
            note.color = color.clone();
        }
        if let Some(pinned) = self.is_pinned {
            note.is_pinned = pinned;
        }
        if let Some(archived) = self.is_archived {
            note.is_archived = archived;
        }
        if note.is_archived {
            note.is_pinned = false;
        }
        if let Some(labels) = &self.labels {
            note.labels = labels.clone();
        }
    }
}

/// A validated note awaiting insertion. The store assigns `order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub id: ObjectId,
    pub owner: ObjectId,
    pub title: String,
    pub description: String,
    pub color: String,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub labels: Vec<ObjectId>,
    pub created_at: DateTime<Utc>,
}

impl NewNote {
    /// Materialize the note with the order picked by the store.
    pub fn into_note(self, order: i64) -> Note {
        Note {
            id: self.id,
            title: self.title,
            description: self.description,
            color: self.color,
            is_pinned: self.is_pinned,
            is_archived: self.is_archived,
            labels: self.labels,
            owner: self.owner,
            order,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Request for creating a note.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub title: String,
    pub description: String,
    pub color: Option<String>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    pub labels: Option<Vec<ObjectId>>,
}

/// Partial update of a note. `order` is deliberately absent: only reorder moves notes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    pub labels: Option<Vec<ObjectId>>,
}

/// Request to move a note to a new position in its owner's ordering.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub note_id: ObjectId,
    pub new_order: i64,
}

/// Result of a bulk attach/detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedCount {
    pub modified_count: u64,
}

/// Remove duplicate ids, keeping the first occurrence.
pub fn dedup_ids(ids: &[ObjectId]) -> Vec<ObjectId> {
    let mut out: Vec<ObjectId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

/// Default color for a new label.
pub fn default_label_color() -> String {
    defaults::LABEL_COLOR.to_string()
}

/// Default color for a new note.
pub fn default_note_color() -> String {
    defaults::NOTE_COLOR.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note() -> Note {
        let now = Utc::now();
        Note {
            id: ObjectId::new(),
            title: "Groceries".to_string(),
            description: "milk, eggs".to_string(),
            color: default_note_color(),
            is_pinned: false,
            is_archived: false,
            labels: Vec::new(),
            owner: ObjectId::new(),
            order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_archiving_unpins() {
        let mut note = sample_note();
        note.is_pinned = true;
        note.toggle_archive();
        assert!(note.is_archived);
        assert!(!note.is_pinned);
    }

    #[test]
    fn test_unarchiving_does_not_restore_pin() {
        let mut note = sample_note();
        note.is_pinned = true;
        note.toggle_archive();
        note.toggle_archive();
        assert!(!note.is_archived);
        assert!(!note.is_pinned);
    }

    #[test]
    fn test_patch_touches_only_named_fields() {
        let mut note = sample_note();
        let label = ObjectId::new();
        note.labels = vec![label];
        NotePatch {
            color: Some("#000".into()),
            ..Default::default()
        }
        .apply_to(&mut note);
        assert_eq!(note.color, "#000");
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.labels, vec![label]);
    }

    #[test]
    fn test_patch_archiving_unpins() {
        let mut note = sample_note();
        NotePatch {
            is_pinned: Some(true),
            is_archived: Some(true),
            ..Default::default()
        }
        .apply_to(&mut note);
        assert!(note.is_archived);
        assert!(!note.is_pinned);
    }

    #[test]
    fn test_toggle_pin_leaves_archive_alone() {
        let mut note = sample_note();
        note.toggle_pin();
        assert!(note.is_pinned);
        assert!(!note.is_archived);
    }

    #[test]
    fn test_view_resolves_labels_in_note_order() {
        let mut note = sample_note();
        let work = LabelSummary {
            id: ObjectId::new(),
            name: "Work".into(),
            color: "#f00".into(),
        };
        let home = LabelSummary {
            id: ObjectId::new(),
            name: "Home".into(),
            color: "#00f".into(),
        };
        note.labels = vec![home.id, work.id];

        let view = NoteView::resolve(note, &[work.clone(), home.clone()]);
        assert_eq!(view.labels, vec![home, work]);
    }

    #[test]
    fn test_dedup_ids_keeps_first_occurrence() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_eq!(dedup_ids(&[a, b, a, b, a]), vec![a, b]);
    }

    #[test]
    fn test_label_with_count_serializes_flat() {
        let label = Label {
            id: ObjectId::new(),
            name: "Work".into(),
            color: "#ff0000".into(),
            owner: ObjectId::new(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(LabelWithCount {
            label,
            note_count: 3,
        })
        .unwrap();
        assert_eq!(json["name"], "Work");
        assert_eq!(json["noteCount"], 3);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_note_serializes_camel_case() {
        let json = serde_json::to_value(sample_note()).unwrap();
        assert_eq!(json["isPinned"], false);
        assert_eq!(json["isArchived"], false);
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn test_reorder_request_deserializes() {
        let req: ReorderRequest = serde_json::from_str(
            r#"{"noteId":"507f1f77bcf86cd799439011","newOrder":2}"#,
        )
        .unwrap();
        assert_eq!(req.new_order, 2);
    }
}
