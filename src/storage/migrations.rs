//! PostgreSQL migration system for schema management.
//!
//! Migrations are embedded in the binary and applied in version order when
//! the service starts or when `music-library migrate` runs. Applied versions
//! are recorded in `<table>_schema_migrations`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use music_library::storage::migrations::{Migration, MigrationRunner};
//!
//! const MIGRATIONS: &[Migration] = &[
//!     Migration {
//!         version: 1,
//!         description: "Initial table",
//!         sql: "CREATE TABLE IF NOT EXISTS {table} (song TEXT NOT NULL);",
//!     },
//! ];
//!
//! let runner = MigrationRunner::new(pool, "songs");
//! runner.run(MIGRATIONS).await?;
//! ```

use crate::{Error, Result};
use deadpool_postgres::{Object, Pool};

/// A single migration with version and SQL.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Migration version (sequential, starting at 1).
    pub version: i32,
    /// Human-readable description.
    pub description: &'static str,
    /// SQL to apply (may contain multiple statements separated by semicolons).
    /// Use `{table}` as a placeholder for the table name.
    pub sql: &'static str,
}

/// Runs migrations for a PostgreSQL table.
pub struct MigrationRunner {
    pool: Pool,
    table_name: String,
}

fn connection_error(e: impl std::fmt::Display) -> Error {
    Error::operation("migration_get_connection", e)
}

impl MigrationRunner {
    /// Creates a new migration runner.
    #[must_use]
    pub fn new(pool: Pool, table_name: impl Into<String>) -> Self {
        Self {
            pool,
            table_name: table_name.into(),
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Runs all pending migrations.
    ///
    /// Returns the number of migrations applied.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails. A failed migration leaves no
    /// partial changes behind.
    pub async fn run(&self, migrations: &[Migration]) -> Result<usize> {
        let mut client = self.pool.get().await.map_err(connection_error)?;

        self.ensure_migrations_table(&client).await?;
        let current_version = self.get_current_version(&client).await?;

        let mut pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| m.version > current_version)
            .collect();
        pending.sort_by_key(|m| m.version);

        for migration in &pending {
            self.apply_migration(&mut client, migration).await?;
        }

        if pending.is_empty() {
            tracing::debug!(
                table = %self.table_name,
                version = current_version,
                "Schema is up to date"
            );
        }
        Ok(pending.len())
    }

    /// Returns the current schema version (0 if never migrated).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub async fn current_version(&self) -> Result<i32> {
        let client = self.pool.get().await.map_err(connection_error)?;

        if !self
            .table_exists(&client, &self.migrations_table_name())
            .await?
        {
            return Ok(0);
        }

        self.get_current_version(&client).await
    }

    /// Drops the managed table and its migration history.
    ///
    /// # Errors
    ///
    /// Returns an error if either table cannot be dropped.
    pub async fn rollback(&self) -> Result<()> {
        let mut client = self.pool.get().await.map_err(connection_error)?;
        let migrations_table = self.migrations_table_name();

        let tx = client
            .transaction()
            .await
            .map_err(|e| Error::operation("migration_rollback_begin_tx", e))?;

        for table in [self.table_name.as_str(), migrations_table.as_str()] {
            tx.execute(&format!("DROP TABLE IF EXISTS {table}"), &[])
                .await
                .map_err(|e| Error::operation(format!("migration_rollback_drop_{table}"), e))?;
        }

        tx.commit()
            .await
            .map_err(|e| Error::operation("migration_rollback_commit", e))?;

        tracing::info!(table = %self.table_name, "Dropped table and migration history");
        Ok(())
    }

    /// Returns the name of the migrations tracking table.
    fn migrations_table_name(&self) -> String {
        format!("{}_schema_migrations", self.table_name)
    }

    /// Ensures the `schema_migrations` table exists.
    async fn ensure_migrations_table(&self, client: &Object) -> Result<()> {
        let migrations_table = self.migrations_table_name();

        let sql = format!(
            r"
            CREATE TABLE IF NOT EXISTS {migrations_table} (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "
        );

        client
            .execute(&sql, &[])
            .await
            .map_err(|e| Error::operation("create_migrations_table", e))?;

        Ok(())
    }

    /// Checks if a table exists in the current schema search path.
    async fn table_exists(&self, client: &Object, table_name: &str) -> Result<bool> {
        let row = client
            .query_one("SELECT to_regclass($1) IS NOT NULL", &[&table_name])
            .await
            .map_err(|e| Error::operation("migration_table_exists", e))?;

        row.try_get(0)
            .map_err(|e| Error::operation("migration_table_exists", e))
    }

    /// Gets the current schema version.
    async fn get_current_version(&self, client: &Object) -> Result<i32> {
        let migrations_table = self.migrations_table_name();
        let sql = format!("SELECT COALESCE(MAX(version), 0) FROM {migrations_table}");

        let row = client
            .query_one(&sql, &[])
            .await
            .map_err(|e| Error::operation("migration_current_version", e))?;

        row.try_get(0)
            .map_err(|e| Error::operation("migration_current_version", e))
    }

    /// Applies a single migration within a transaction.
    ///
    /// All statements and the version record commit together or not at all.
    async fn apply_migration(&self, client: &mut Object, migration: &Migration) -> Result<()> {
        let migrations_table = self.migrations_table_name();
        let sql = migration.sql.replace("{table}", &self.table_name);

        let tx = client.transaction().await.map_err(|e| {
            Error::operation(format!("migration_v{}_begin_tx", migration.version), e)
        })?;

        for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            tx.execute(statement, &[]).await.map_err(|e| {
                Error::operation(
                    format!("migration_v{}: {}", migration.version, migration.description),
                    e,
                )
            })?;
        }

        let record_sql =
            format!("INSERT INTO {migrations_table} (version, description) VALUES ($1, $2)");
        tx.execute(&record_sql, &[&migration.version, &migration.description])
            .await
            .map_err(|e| Error::operation("record_migration", e))?;

        tx.commit().await.map_err(|e| {
            Error::operation(format!("migration_v{}_commit", migration.version), e)
        })?;

        tracing::info!(
            version = migration.version,
            description = migration.description,
            table = %self.table_name,
            "Applied migration"
        );

        Ok(())
    }
}

/// Maximum version across a set of migrations.
#[must_use]
pub fn max_version(migrations: &[Migration]) -> i32 {
    migrations.iter().map(|m| m.version).max().unwrap_or(0)
}
