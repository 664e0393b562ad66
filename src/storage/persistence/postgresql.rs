//! PostgreSQL-based song store.
//!
//! Songs live in one table (default `songs`) with no primary key; the
//! `(group, song)` pair is kept unique by the library's existence checks and
//! looked up through a `lower("group"), lower(song)` index.

use crate::config::DatabaseConfig;
use crate::models::{Page, Song, SongFilter, SongKey};
use crate::storage::migrations::{Migration, MigrationRunner};
use crate::storage::query::{SONG_COLUMNS, build_list_query};
use crate::storage::traits::SongStore;
use crate::{Error, Result};
use async_trait::async_trait;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts,
};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::NoTls;

/// Embedded migrations compiled into the binary.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial songs table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS {table} (
                "group" TEXT NOT NULL,
                song TEXT NOT NULL,
                releasedate TEXT,
                text TEXT[] NOT NULL DEFAULT '{}',
                link TEXT
            )
        "#,
    },
    Migration {
        version: 2,
        description: "Add case-insensitive lookup index",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_{table}_lookup ON {table} (lower("group"), lower(song))
        "#,
    },
];

/// PostgreSQL-based song store.
pub struct PostgresSongStore {
    /// Connection pool.
    pool: Pool,
    /// Table name for songs.
    table_name: String,
}

impl std::fmt::Debug for PostgresSongStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSongStore")
            .field("table_name", &self.table_name)
            .field("pool_size", &self.pool.status().size)
            .finish_non_exhaustive()
    }
}

/// Helper to map pool errors.
fn pool_error(e: impl std::fmt::Display) -> Error {
    Error::operation("postgres_song_store_get_client", e)
}

/// Helper to map query errors.
fn query_error(op: &str, e: impl std::fmt::Display) -> Error {
    Error::operation(op, e)
}

impl PostgresSongStore {
    /// Creates a store from the database settings.
    ///
    /// Connections are opened lazily; call [`Self::run_migrations`] before
    /// serving requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or the pool fails to
    /// initialize.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let cfg = Self::build_pool_config(config)?;

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| Error::operation("postgres_song_store_create_pool", e))?;

        Ok(Self {
            pool,
            table_name: config.table_name.clone(),
        })
    }

    /// Creates a store from a connection URL and table name.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or the pool fails to
    /// initialize.
    pub fn from_url(connection_url: &str, table_name: impl Into<String>) -> Result<Self> {
        let config = DatabaseConfig {
            url: Some(connection_url.to_string().into()),
            table_name: table_name.into(),
            ..DatabaseConfig::default()
        };
        config.validate()?;
        Self::new(&config)
    }

    /// Parses the connection URL into a tokio-postgres config.
    fn parse_connection_url(url: &str) -> Result<tokio_postgres::Config> {
        url.parse::<tokio_postgres::Config>()
            .map_err(|e| Error::operation("postgres_song_store_parse_url", e))
    }

    /// Extracts host string from tokio-postgres Host.
    #[cfg(unix)]
    fn host_to_string(h: &tokio_postgres::config::Host) -> String {
        match h {
            tokio_postgres::config::Host::Tcp(s) => s.clone(),
            tokio_postgres::config::Host::Unix(p) => p.to_string_lossy().to_string(),
        }
    }

    /// Extracts host string from tokio-postgres Host (Windows: Tcp only).
    #[cfg(not(unix))]
    fn host_to_string(h: &tokio_postgres::config::Host) -> String {
        let tokio_postgres::config::Host::Tcp(s) = h;
        s.clone()
    }

    /// Builds a deadpool config from the URL, then applies discrete settings.
    ///
    /// The pool waits at most 5 seconds for a connection so an exhausted or
    /// unreachable database fails requests instead of hanging them.
    fn build_pool_config(config: &DatabaseConfig) -> Result<Config> {
        let mut cfg = Config::new();

        if let Some(url) = &config.url {
            let parsed = Self::parse_connection_url(url.expose_secret())?;
            cfg.host = parsed.get_hosts().first().map(Self::host_to_string);
            cfg.port = parsed.get_ports().first().copied();
            cfg.user = parsed.get_user().map(String::from);
            cfg.password = parsed
                .get_password()
                .map(|p| String::from_utf8_lossy(p).to_string());
            cfg.dbname = parsed.get_dbname().map(String::from);
        }

        if let Some(host) = &config.host {
            cfg.host = Some(host.clone());
        }
        if let Some(port) = config.port {
            cfg.port = Some(port);
        }
        if let Some(user) = &config.user {
            cfg.user = Some(user.clone());
        }
        if let Some(password) = &config.password {
            cfg.password = Some(password.expose_secret().to_string());
        }
        if let Some(dbname) = &config.dbname {
            cfg.dbname = Some(dbname.clone());
        }

        cfg.pool = Some(PoolConfig {
            max_size: config.pool_max_size,
            timeouts: Timeouts {
                wait: Some(Duration::from_secs(5)),
                create: Some(Duration::from_secs(5)),
                recycle: Some(Duration::from_secs(5)),
            },
            ..Default::default()
        });
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        Ok(cfg)
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns a migration runner for this store's table.
    #[must_use]
    pub fn migration_runner(&self) -> MigrationRunner {
        MigrationRunner::new(self.pool.clone(), &self.table_name)
    }

    /// Applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or a migration fails.
    pub async fn run_migrations(&self) -> Result<usize> {
        self.migration_runner().run(MIGRATIONS).await
    }

    /// Converts a database row to a Song.
    fn row_to_song(row: &tokio_postgres::Row) -> Result<Song> {
        let column = |e: tokio_postgres::Error| query_error("postgres_song_store_decode_row", e);

        Ok(Song {
            group: row.try_get("group").map_err(column)?,
            song: row.try_get("song").map_err(column)?,
            release_date: row.try_get("releasedate").map_err(column)?,
            text: row.try_get("text").map_err(column)?,
            link: row.try_get("link").map_err(column)?,
        })
    }
}

#[async_trait]
impl SongStore for PostgresSongStore {
    async fn find(&self, key: &SongKey) -> Result<Option<Song>> {
        let client = self.pool.get().await.map_err(pool_error)?;

        let query = format!(
            r#"SELECT {SONG_COLUMNS} FROM {}
            WHERE lower("group") = $1 AND lower(song) = $2
            LIMIT 1"#,
            self.table_name
        );

        let row = client
            .query_opt(&query, &[&key.group(), &key.song()])
            .await
            .map_err(|e| query_error("postgres_song_store_find", e))?;

        row.as_ref().map(Self::row_to_song).transpose()
    }

    async fn insert(&self, song: &Song) -> Result<()> {
        let client = self.pool.get().await.map_err(pool_error)?;

        let insert = format!(
            r#"INSERT INTO {} ("group", song, releasedate, text, link)
            VALUES ($1, $2, $3, $4, $5)"#,
            self.table_name
        );

        client
            .execute(
                &insert,
                &[
                    &song.group,
                    &song.song,
                    &song.release_date,
                    &song.text,
                    &song.link,
                ],
            )
            .await
            .map_err(|e| query_error("postgres_song_store_insert", e))?;

        Ok(())
    }

    async fn list(&self, filter: &SongFilter, page: Page) -> Result<Vec<Song>> {
        let client = self.pool.get().await.map_err(pool_error)?;
        let query = build_list_query(&self.table_name, filter, page);

        let rows = client
            .query(&query.sql, &query.param_refs())
            .await
            .map_err(|e| query_error("postgres_song_store_list", e))?;

        rows.iter().map(Self::row_to_song).collect()
    }

    async fn rename(
        &self,
        from: &SongKey,
        to: &SongKey,
        verses: Option<&[String]>,
    ) -> Result<bool> {
        let client = self.pool.get().await.map_err(pool_error)?;

        let update = format!(
            r#"UPDATE {} SET "group" = $1, song = $2, text = COALESCE($3, text)
            WHERE lower("group") = $4 AND lower(song) = $5"#,
            self.table_name
        );

        let rows = client
            .execute(
                &update,
                &[&to.group(), &to.song(), &verses, &from.group(), &from.song()],
            )
            .await
            .map_err(|e| query_error("postgres_song_store_rename", e))?;

        Ok(rows > 0)
    }

    async fn delete(&self, key: &SongKey) -> Result<bool> {
        let client = self.pool.get().await.map_err(pool_error)?;

        let delete = format!(
            r#"DELETE FROM {} WHERE lower("group") = $1 AND lower(song) = $2"#,
            self.table_name
        );

        let rows = client
            .execute(&delete, &[&key.group(), &key.song()])
            .await
            .map_err(|e| query_error("postgres_song_store_delete", e))?;

        Ok(rows > 0)
    }

    async fn verses(&self, key: &SongKey, page: Page) -> Result<Option<Vec<String>>> {
        Ok(self
            .find(key)
            .await?
            .map(|song| page.slice(&song.text).to_vec()))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
