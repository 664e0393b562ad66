//! Storage layer abstraction.
//!
//! - [`SongStore`]: the async trait every backend implements
//! - [`PostgresSongStore`]: authoritative storage in PostgreSQL
//! - [`MemorySongStore`]: process-local storage for tests and local runs
//! - [`query`]: the filtered list query builder
//! - [`migrations`]: embedded schema migrations

// Dropping pooled connections slightly earlier buys nothing.
#![allow(clippy::significant_drop_tightening)]

pub mod migrations;
pub mod persistence;
pub mod query;
pub mod traits;

pub use persistence::{MIGRATIONS, MemorySongStore, PostgresSongStore};
pub use traits::SongStore;

use crate::Result;
use crate::config::{DatabaseConfig, StorageBackend};
use std::sync::Arc;

/// Opens the configured store, applying pending migrations for PostgreSQL.
///
/// # Errors
///
/// Returns an error if the settings are invalid, the database is
/// unreachable, or a migration fails.
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn SongStore>> {
    config.validate()?;

    match config.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory song store; data is lost on restart");
            Ok(Arc::new(MemorySongStore::new()))
        },
        StorageBackend::Postgres => {
            let store = PostgresSongStore::new(config)?;
            let applied = store.run_migrations().await?;
            tracing::info!(
                table = store.table_name(),
                applied,
                "PostgreSQL song store ready"
            );
            Ok(Arc::new(store))
        },
    }
}
