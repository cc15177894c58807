//! Label repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info};

use notekeep_core::{
    Error, Label, LabelRepository, LabelSummary, LabelWithCount, ObjectId, Result,
};

use crate::support::{id_strings, map_write_error, parse_id};

fn label_not_found() -> Error {
    Error::NotFound("Label not found".to_string())
}

fn map_row_to_label(row: &PgRow) -> Result<Label> {
    let id: String = row.try_get("id")?;
    let owner: String = row.try_get("owner_id")?;
    Ok(Label {
        id: parse_id(&id)?,
        name: row.try_get("name")?,
        color: row.try_get("color")?,
        owner: parse_id(&owner)?,
        created_at: row.try_get("created_at_utc")?,
    })
}

/// PostgreSQL implementation of LabelRepository.
pub struct PgLabelRepository {
    pool: Pool<Postgres>,
}

impl PgLabelRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LabelRepository for PgLabelRepository {
    async fn fetch(&self, id: ObjectId) -> Result<Option<Label>> {
        let row = sqlx::query(
            "SELECT id, owner_id, name, color, created_at_utc FROM label WHERE id = $1",
        )
        .bind(id.to_hex())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        row.as_ref().map(map_row_to_label).transpose()
    }

    async fn list_with_counts(&self, owner: ObjectId) -> Result<Vec<LabelWithCount>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.owner_id, l.name, l.color, l.created_at_utc,
                   COUNT(nl.note_id) AS note_count
            FROM label l
            LEFT JOIN note_label nl ON nl.label_id = l.id
            WHERE l.owner_id = $1
            GROUP BY l.id
            ORDER BY l.name COLLATE "C", l.id
            "#,
        )
        .bind(owner.to_hex())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let labels = rows
            .iter()
            .map(|row| {
                Ok(LabelWithCount {
                    label: map_row_to_label(row)?,
                    note_count: row.try_get("note_count")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            subsystem = "db",
            component = "labels",
            op = "list",
            owner_id = %owner,
            result_count = labels.len(),
            "Listed labels"
        );
        Ok(labels)
    }

    async fn name_exists(
        &self,
        owner: ObjectId,
        name: &str,
        exclude: Option<ObjectId>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM label
                WHERE owner_id = $1 AND name = $2
                  AND ($3::text IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(owner.to_hex())
        .bind(name)
        .bind(exclude.map(|id| id.to_hex()))
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn owned_summaries(&self, owner: ObjectId, ids: &[ObjectId]) -> Result<Vec<LabelSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query("SELECT id, name, color FROM label WHERE owner_id = $1 AND id = ANY($2)")
            .bind(owner.to_hex())
            .bind(id_strings(ids))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut found = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id")?;
            found.push(LabelSummary {
                id: parse_id(&id)?,
                name: row.try_get("name")?,
                color: row.try_get("color")?,
            });
        }

        // Return in request order.
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|l| l.id == *id).cloned())
            .collect())
    }

    async fn insert(&self, label: &Label) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO label (id, owner_id, name, color, created_at_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(label.id.to_hex())
        .bind(label.owner.to_hex())
        .bind(&label.name)
        .bind(&label.color)
        .bind(label.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn update(&self, label: &Label) -> Result<()> {
        let result = sqlx::query("UPDATE label SET name = $2, color = $3 WHERE id = $1")
            .bind(label.id.to_hex())
            .bind(&label.name)
            .bind(&label.color)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        if result.rows_affected() == 0 {
            return Err(label_not_found());
        }
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let unlinked = sqlx::query(
            r#"
            WITH unlinked AS (
                DELETE FROM note_label WHERE label_id = $1 RETURNING note_id
            )
            UPDATE note SET updated_at_utc = NOW()
            WHERE id IN (SELECT note_id FROM unlinked)
            "#,
        )
        .bind(id.to_hex())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        let result = sqlx::query("DELETE FROM label WHERE id = $1")
            .bind(id.to_hex())
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(label_not_found());
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "labels",
            op = "delete_cascade",
            label_id = %id,
            modified_count = unlinked,
            "Deleted label"
        );
        Ok(unlinked)
    }

    async fn note_count(&self, id: ObjectId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM note_label WHERE label_id = $1")
            .bind(id.to_hex())
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(count)
    }
}
