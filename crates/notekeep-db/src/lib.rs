//! # notekeep-db
//!
//! Storage for notekeep notes and labels.
//!
//! - [`PgNoteRepository`] and [`PgLabelRepository`] keep data in PostgreSQL,
//!   with labels linked through the `note_label` join table and note search
//!   backed by a generated `tsvector` column.
//! - [`MemoryStore`] implements the same traits in process memory.
//! - [`Database`] bundles a pool with both PostgreSQL repositories.
//!
//! ```rust,ignore
//! use notekeep_db::{Database, ListNotesRequest, NoteRepository};
//!
//! let db = Database::connect("postgres://localhost/notekeep").await?;
//! db.migrate().await?;
//! let notes = db.notes.list(owner, &ListNotesRequest::default()).await?;
//! ```

use std::sync::Arc;

use sqlx::PgPool;

pub mod labels;
pub mod memory;
pub mod notes;
pub mod pool;
mod support;

// Public so the integration tests under tests/ can reach it.
pub mod test_fixtures;

pub use notekeep_core::*;

pub use labels::PgLabelRepository;
pub use memory::MemoryStore;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};

/// A connection pool plus the repositories sharing it.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
    pub notes: Arc<PgNoteRepository>,
    pub labels: Arc<PgLabelRepository>,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self {
            notes: Arc::new(PgNoteRepository::new(pool.clone())),
            labels: Arc::new(PgLabelRepository::new(pool.clone())),
            pool,
        }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(create_pool(url).await?))
    }

    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        Ok(Self::new(create_pool_with_config(url, config).await?))
    }

    /// Apply the workspace `migrations/` directory.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
