//! Note repository implementation.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Pool, Postgres, Row, Transaction};
use tracing::{debug, info};

use notekeep_core::{
    next_order, Error, ListNotesRequest, NewNote, Note, NotePatch, NoteRepository, ObjectId,
    ReorderPlan, Result, SortField, SortKey,
};

use crate::support::{id_strings, lock_owner, map_write_error, parse_id, parse_ids};

/// Columns selected for a full note, labels in attach order.
const NOTE_COLUMNS: &str = r#"
    n.id, n.owner_id, n.title, n.description, n.color,
    n.is_pinned, n.is_archived, n.sort_order,
    n.created_at_utc, n.updated_at_utc,
    ARRAY(
        SELECT nl.label_id FROM note_label nl
        WHERE nl.note_id = n.id
        ORDER BY nl.position, nl.attached_at_utc
    ) AS labels
"#;

/// Text columns sort bytewise so results match the in-memory store.
fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Title => "n.title COLLATE \"C\"",
        SortField::Description => "n.description COLLATE \"C\"",
        SortField::Color => "n.color COLLATE \"C\"",
        SortField::IsPinned => "n.is_pinned",
        SortField::IsArchived => "n.is_archived",
        SortField::Order => "n.sort_order",
        SortField::CreatedAt => "n.created_at_utc",
        SortField::UpdatedAt => "n.updated_at_utc",
    }
}

/// Build the ORDER BY body; id breaks ties.
fn build_order_clause(keys: &[SortKey]) -> String {
    let mut parts: Vec<String> = keys
        .iter()
        .map(|k| {
            format!(
                "{} {}",
                sort_column(k.field),
                if k.descending { "DESC" } else { "ASC" }
            )
        })
        .collect();
    parts.push("n.id ASC".to_string());
    parts.join(", ")
}

/// Join search words into an any-of tsquery.
fn build_tsquery(terms: &[String]) -> String {
    terms.join(" | ")
}

/// Append the filter predicates of `req`. `$1` is the owner.
fn add_list_filters(query: &mut String, req: &ListNotesRequest) {
    let mut param_idx = 2;
    if req.is_archived.is_some() {
        query.push_str(&format!("AND n.is_archived = ${} ", param_idx));
        param_idx += 1;
    }
    if req.is_pinned.is_some() {
        query.push_str(&format!("AND n.is_pinned = ${} ", param_idx));
        param_idx += 1;
    }
    if req.labels.is_some() {
        query.push_str(&format!(
            "AND EXISTS (SELECT 1 FROM note_label nl WHERE nl.note_id = n.id AND nl.label_id = ANY(${})) ",
            param_idx
        ));
        param_idx += 1;
    }
    match &req.search {
        Some(terms) if terms.is_empty() => query.push_str("AND FALSE "),
        Some(_) => {
            query.push_str(&format!(
                "AND n.search_vector @@ to_tsquery('english', ${}) ",
                param_idx
            ));
        }
        None => {}
    }
}

/// Bind the parameters `add_list_filters` referenced, in the same order.
macro_rules! bind_list_filters {
    ($query:expr, $req:expr) => {{
        let mut q = $query;
        if let Some(archived) = $req.is_archived {
            q = q.bind(archived);
        }
        if let Some(pinned) = $req.is_pinned {
            q = q.bind(pinned);
        }
        if let Some(labels) = &$req.labels {
            q = q.bind(id_strings(labels));
        }
        if let Some(terms) = &$req.search {
            if !terms.is_empty() {
                q = q.bind(build_tsquery(terms));
            }
        }
        q
    }};
}

fn map_row_to_note(row: &PgRow) -> Result<Note> {
    let id: String = row.try_get("id")?;
    let owner: String = row.try_get("owner_id")?;
    let labels: Vec<String> = row.try_get("labels")?;
    Ok(Note {
        id: parse_id(&id)?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        color: row.try_get("color")?,
        is_pinned: row.try_get("is_pinned")?,
        is_archived: row.try_get("is_archived")?,
        labels: parse_ids(&labels)?,
        owner: parse_id(&owner)?,
        order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at_utc")?,
        updated_at: row.try_get("updated_at_utc")?,
    })
}

async fn fetch_note<'e, E: PgExecutor<'e>>(executor: E, id: ObjectId) -> Result<Option<Note>> {
    let row = sqlx::query(&format!("SELECT {} FROM note n WHERE n.id = $1", NOTE_COLUMNS))
        .bind(id.to_hex())
        .fetch_optional(executor)
        .await
        .map_err(Error::Database)?;
    row.as_ref().map(map_row_to_note).transpose()
}

/// Replace a note's label set, keeping the given order.
async fn replace_labels(
    tx: &mut Transaction<'_, Postgres>,
    note_id: ObjectId,
    labels: &[ObjectId],
) -> Result<()> {
    sqlx::query("DELETE FROM note_label WHERE note_id = $1")
        .bind(note_id.to_hex())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

    if labels.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO note_label (note_id, label_id, position)
        SELECT $1, l.label_id, (l.ord - 1)::int
        FROM UNNEST($2::text[]) WITH ORDINALITY AS l(label_id, ord)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(note_id.to_hex())
    .bind(id_strings(labels))
    .execute(&mut **tx)
    .await
    .map_err(map_write_error)?;
    Ok(())
}

fn note_not_found() -> Error {
    Error::NotFound("Note not found".to_string())
}

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Run a single-row flag flip and return the note as stored.
    async fn flip(&self, id: ObjectId, assignments: &str) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = sqlx::query(&format!(
            "UPDATE note SET {}, updated_at_utc = NOW() WHERE id = $1",
            assignments
        ))
        .bind(id.to_hex())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(note_not_found());
        }
        let stored = fetch_note(&mut *tx, id).await?.ok_or_else(note_not_found)?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(stored)
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn fetch(&self, id: ObjectId) -> Result<Option<Note>> {
        fetch_note(&self.pool, id).await
    }

    async fn list(&self, owner: ObjectId, req: &ListNotesRequest) -> Result<Vec<Note>> {
        let start = Instant::now();
        let mut query = format!(
            "SELECT {} FROM note n WHERE n.owner_id = $1 ",
            NOTE_COLUMNS
        );
        add_list_filters(&mut query, req);
        query.push_str(&format!("ORDER BY {}", build_order_clause(&req.sort)));

        let rows = {
            let q = sqlx::query(&query).bind(owner.to_hex());
            let q = bind_list_filters!(q, req);
            q.fetch_all(&self.pool).await.map_err(Error::Database)?
        };
        let notes = rows.iter().map(map_row_to_note).collect::<Result<Vec<_>>>()?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "list",
            owner_id = %owner,
            result_count = notes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Listed notes"
        );
        Ok(notes)
    }

    async fn insert(&self, note: NewNote) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        lock_owner(&mut tx, note.owner).await?;

        let current_max: Option<i64> =
            sqlx::query_scalar("SELECT MAX(sort_order) FROM note WHERE owner_id = $1")
                .bind(note.owner.to_hex())
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;
        let order = next_order(current_max)?;

        sqlx::query(
            r#"
            INSERT INTO note (id, owner_id, title, description, color,
                              is_pinned, is_archived, sort_order,
                              created_at_utc, updated_at_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            "#,
        )
        .bind(note.id.to_hex())
        .bind(note.owner.to_hex())
        .bind(&note.title)
        .bind(&note.description)
        .bind(&note.color)
        .bind(note.is_pinned)
        .bind(note.is_archived)
        .bind(order)
        .bind(note.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        replace_labels(&mut tx, note.id, &note.labels).await?;

        let stored = fetch_note(&mut *tx, note.id)
            .await?
            .ok_or_else(note_not_found)?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "insert",
            note_id = %stored.id,
            owner_id = %stored.owner,
            new_order = order,
            "Inserted note"
        );
        Ok(stored)
    }

    async fn update(&self, id: ObjectId, patch: &NotePatch) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Right-hand sides read the pre-update row; an archived result is unpinned.
        let result = sqlx::query(
            r#"
            UPDATE note
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                color = COALESCE($4, color),
                is_archived = COALESCE($6, is_archived),
                is_pinned = CASE WHEN COALESCE($6, is_archived) THEN FALSE
                                 ELSE COALESCE($5, is_pinned) END,
                updated_at_utc = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.to_hex())
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.color.as_deref())
        .bind(patch.is_pinned)
        .bind(patch.is_archived)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(note_not_found());
        }

        if let Some(labels) = &patch.labels {
            replace_labels(&mut tx, id, labels).await?;
        }

        let stored = fetch_note(&mut *tx, id).await?.ok_or_else(note_not_found)?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(stored)
    }

    async fn toggle_pin(&self, id: ObjectId) -> Result<Note> {
        self.flip(id, "is_pinned = NOT is_pinned").await
    }

    async fn toggle_archive(&self, id: ObjectId) -> Result<Note> {
        self.flip(
            id,
            "is_archived = NOT is_archived, \
             is_pinned = CASE WHEN is_archived THEN is_pinned ELSE FALSE END",
        )
        .await
    }

    async fn delete(&self, id: ObjectId) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id.to_hex())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(note_not_found());
        }
        Ok(())
    }

    async fn reorder(&self, owner: ObjectId, id: ObjectId, new_order: i64) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        lock_owner(&mut tx, owner).await?;

        // Re-read under the lock: a concurrent move may have changed it.
        let old_order: i64 =
            sqlx::query_scalar("SELECT sort_order FROM note WHERE id = $1 AND owner_id = $2")
                .bind(id.to_hex())
                .bind(owner.to_hex())
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?
                .ok_or_else(note_not_found)?;

        let plan = ReorderPlan::new(old_order, new_order);
        let mut shifted = 0;
        if let Some(shift) = plan.shift {
            shifted = sqlx::query(
                r#"
                UPDATE note
                SET sort_order = sort_order + $1, updated_at_utc = NOW()
                WHERE owner_id = $2 AND id <> $3 AND sort_order BETWEEN $4 AND $5
                "#,
            )
            .bind(shift.delta)
            .bind(owner.to_hex())
            .bind(id.to_hex())
            .bind(shift.lower)
            .bind(shift.upper)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

            sqlx::query("UPDATE note SET sort_order = $1, updated_at_utc = NOW() WHERE id = $2")
                .bind(plan.new_order)
                .bind(id.to_hex())
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
        }

        let stored = fetch_note(&mut *tx, id).await?.ok_or_else(note_not_found)?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "notes",
            op = "reorder",
            note_id = %id,
            owner_id = %owner,
            old_order = plan.old_order,
            new_order = plan.new_order,
            modified_count = shifted,
            "Reordered note"
        );
        Ok(stored)
    }

    async fn add_label(
        &self,
        owner: ObjectId,
        label_id: ObjectId,
        note_ids: &[ObjectId],
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            WITH targets AS (
                SELECT n.id FROM note n
                WHERE n.owner_id = $1
                  AND n.id = ANY($3)
                  AND NOT EXISTS (
                      SELECT 1 FROM note_label nl
                      WHERE nl.note_id = n.id AND nl.label_id = $2
                  )
            ),
            linked AS (
                INSERT INTO note_label (note_id, label_id, position)
                SELECT t.id, $2, COALESCE(
                    (SELECT MAX(nl.position) + 1 FROM note_label nl WHERE nl.note_id = t.id),
                    0
                )
                FROM targets t
                ON CONFLICT DO NOTHING
                RETURNING note_id
            )
            UPDATE note SET updated_at_utc = NOW()
            WHERE id IN (SELECT note_id FROM linked)
            "#,
        )
        .bind(owner.to_hex())
        .bind(label_id.to_hex())
        .bind(id_strings(note_ids))
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "add_label",
            label_id = %label_id,
            owner_id = %owner,
            modified_count = result.rows_affected(),
            "Attached label"
        );
        Ok(result.rows_affected())
    }

    async fn remove_label(
        &self,
        owner: ObjectId,
        label_id: ObjectId,
        note_ids: &[ObjectId],
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            WITH unlinked AS (
                DELETE FROM note_label nl
                USING note n
                WHERE nl.note_id = n.id
                  AND n.owner_id = $1
                  AND nl.label_id = $2
                  AND nl.note_id = ANY($3)
                RETURNING nl.note_id
            )
            UPDATE note SET updated_at_utc = NOW()
            WHERE id IN (SELECT note_id FROM unlinked)
            "#,
        )
        .bind(owner.to_hex())
        .bind(label_id.to_hex())
        .bind(id_strings(note_ids))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "remove_label",
            label_id = %label_id,
            owner_id = %owner,
            modified_count = result.rows_affected(),
            "Detached label"
        );
        Ok(result.rows_affected())
    }
}
