//! Song store trait.

use crate::Result;
use crate::models::{Page, Song, SongFilter, SongKey};
use async_trait::async_trait;

/// Trait for song storage backends.
///
/// Keys passed in are already normalized (see [`SongKey::new`]); stores
/// compare them against stored values case-insensitively. "No such song" is
/// reported as `Ok(None)` or `Ok(false)`, never as an error.
#[async_trait]
pub trait SongStore: Send + Sync {
    /// Looks up a song by key.
    async fn find(&self, key: &SongKey) -> Result<Option<Song>>;

    /// Inserts a song. Uniqueness is the caller's responsibility.
    async fn insert(&self, song: &Song) -> Result<()>;

    /// Lists songs matching `filter`, ordered by group then song.
    async fn list(&self, filter: &SongFilter, page: Page) -> Result<Vec<Song>>;

    /// Renames the song at `from` to `to`, optionally replacing its verses.
    ///
    /// Returns false if no song is stored under `from`.
    async fn rename(&self, from: &SongKey, to: &SongKey, verses: Option<&[String]>)
    -> Result<bool>;

    /// Deletes a song. Returns false if it was not stored.
    async fn delete(&self, key: &SongKey) -> Result<bool>;

    /// Returns the window of the song's verses covered by `page`.
    ///
    /// Returns `None` if the song is not stored.
    async fn verses(&self, key: &SongKey, page: Page) -> Result<Option<Vec<String>>>;

    /// Checks if a song exists.
    async fn exists(&self, key: &SongKey) -> Result<bool> {
        Ok(self.find(key).await?.is_some())
    }

    /// Short backend name for logs and metrics.
    fn backend_name(&self) -> &'static str;
}
