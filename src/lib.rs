//! # Music Library
//!
//! A small HTTP service for a library of songs and their lyrics.
//!
//! Songs are stored in a single PostgreSQL table keyed by the
//! case-insensitive pair `(group, song)`. New entries are enriched with a
//! release date, lyric verses and a link fetched from an external metadata
//! source.
//!
//! ## Layers
//!
//! - [`api`]: axum router, request parsing and HTTP status mapping
//! - [`services`]: the five library operations over a store and a provider
//! - [`storage`]: the [`SongStore`] trait, PostgreSQL and in-memory backends,
//!   the filtered-list query builder and schema migrations
//! - [`enrichment`]: the [`SongInfoProvider`] trait and the HTTP client with
//!   its bounded retry policy
//!
//! ## Example
//!
//! ```rust,ignore
//! use music_library::{SongKey, SongLibrary};
//!
//! let library = SongLibrary::new(store, provider);
//! let song = library.create("Muse", "Supermassive Black Hole").await?;
//! library.delete(&SongKey::new("muse", "supermassive black hole")?).await?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod api;
pub mod config;
pub mod enrichment;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::LibraryConfig;
pub use enrichment::{HttpSongInfoClient, RetryPolicy, SongDetails, SongInfoProvider};
pub use models::{Page, Song, SongFilter, SongKey};
pub use services::SongLibrary;
pub use storage::{MemorySongStore, PostgresSongStore, SongStore};

/// Error type for music library operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When | HTTP |
/// |---------|-------------|------|
/// | `InvalidInput` | Missing or empty fields, non-integer pagination, bad config | 400 |
/// | `NotFound` | The targeted `(group, song)` pair does not exist | 400 / 404 |
/// | `AlreadyExists` | Create or rename targets a pair that already exists | 400 |
/// | `UnknownSong` | The metadata source answered 400 for the pair | 400 |
/// | `Upstream` | The metadata source failed, timed out or sent garbage | 500 |
/// | `OperationFailed` | Database, pool, I/O or runtime failures | 500 |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The song is not in the library.
    #[error("song not found: {group} - {song}")]
    NotFound {
        /// Normalized group name.
        group: String,
        /// Normalized song title.
        song: String,
    },

    /// The song is already in the library.
    #[error("song already exists: {group} - {song}")]
    AlreadyExists {
        /// Normalized group name.
        group: String,
        /// Normalized song title.
        song: String,
    },

    /// The metadata source does not know the song.
    #[error("song unknown to metadata source: {group} - {song}")]
    UnknownSong {
        /// Group name as sent upstream.
        group: String,
        /// Song title as sent upstream.
        song: String,
    },

    /// The metadata source could not be used.
    ///
    /// Raised when:
    /// - every attempt failed at the transport level (connect, timeout)
    /// - the source answered HTTP 500
    /// - the response body is not the expected JSON
    #[error("metadata source failed: {cause}")]
    Upstream {
        /// The underlying cause.
        cause: String,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - PostgreSQL queries or pool checkouts fail
    /// - Filesystem I/O errors occur (config, log files)
    /// - The HTTP listener cannot bind
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from any displayable cause.
    pub fn operation(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    /// Returns true for errors caused by the caller rather than the service.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::NotFound { .. }
                | Self::AlreadyExists { .. }
                | Self::UnknownSong { .. }
        )
    }
}

/// Result type alias for music library operations.
pub type Result<T> = std::result::Result<T, Error>;
