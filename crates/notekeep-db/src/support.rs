//! Helpers shared by the PostgreSQL repositories.

use sqlx::{Postgres, Transaction};

use notekeep_core::{Error, ObjectId, Result, DUPLICATE_LABEL_MSG};

/// Parse an id column. Ids are written by this crate, so a bad one means
/// the row was tampered with.
pub(crate) fn parse_id(raw: &str) -> Result<ObjectId> {
    raw.parse()
        .map_err(|_| Error::Internal(format!("Malformed id in database: {}", raw)))
}

pub(crate) fn parse_ids(raw: &[String]) -> Result<Vec<ObjectId>> {
    raw.iter().map(|s| parse_id(s)).collect()
}

pub(crate) fn id_strings(ids: &[ObjectId]) -> Vec<String> {
    ids.iter().map(ObjectId::to_hex).collect()
}

/// Translate constraint violations raised by writes into domain errors.
///
/// A unique violation can only come from `label_owner_name_key`; a foreign
/// key violation means a label vanished between validation and write.
pub(crate) fn map_write_error(e: sqlx::Error) -> Error {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return Error::Conflict(DUPLICATE_LABEL_MSG.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return Error::InvalidLabels;
        }
    }
    Error::Database(e)
}

/// Serialize order-changing writes of one owner for the rest of `tx`.
pub(crate) async fn lock_owner(tx: &mut Transaction<'_, Postgres>, owner: ObjectId) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(owner.to_hex())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
    Ok(())
}
