//! The five library operations.
//!
//! Every mutating or reading operation on a single song starts with an
//! existence check. The check and the write are separate statements, so two
//! concurrent creators of the same pair can both pass the check.

use crate::enrichment::SongInfoProvider;
use crate::models::{Page, Song, SongFilter, SongKey};
use crate::storage::SongStore;
use crate::Result;
use std::sync::Arc;
use tracing::instrument;

/// Service for song library operations.
#[derive(Clone)]
pub struct SongLibrary {
    store: Arc<dyn SongStore>,
    provider: Arc<dyn SongInfoProvider>,
}

impl std::fmt::Debug for SongLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SongLibrary")
            .field("store", &self.store.backend_name())
            .finish_non_exhaustive()
    }
}

impl SongLibrary {
    /// Creates a new library service.
    #[must_use]
    pub fn new(store: Arc<dyn SongStore>, provider: Arc<dyn SongInfoProvider>) -> Self {
        Self { store, provider }
    }

    /// Adds a song, filling in its details from the metadata provider.
    ///
    /// The provider receives the names as the caller wrote them (trimmed);
    /// the stored record uses the normalized key.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::InvalidInput`] if either name is empty
    /// - [`crate::Error::AlreadyExists`] if the song is already stored
    /// - [`crate::Error::UnknownSong`] / [`crate::Error::Upstream`] from the provider
    /// - [`crate::Error::OperationFailed`] on storage faults
    #[instrument(skip(self), fields(operation = "songs.create"))]
    pub async fn create(&self, group: &str, song: &str) -> Result<Song> {
        let key = SongKey::new(group, song)?;

        if self.store.exists(&key).await? {
            return Err(key.already_exists());
        }

        let details = self.provider.fetch(group.trim(), song.trim()).await?;
        let record = Song::with_details(&key, details);
        self.store.insert(&record).await?;

        tracing::info!(
            group = key.group(),
            song = key.song(),
            verses = record.text.len(),
            "Song added"
        );
        metrics::counter!("songs_created_total").increment(1);
        Ok(record)
    }

    /// Lists songs matching `filter`.
    ///
    /// An empty result is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error on storage faults.
    #[instrument(skip(self), fields(operation = "songs.list"))]
    pub async fn list(&self, filter: &SongFilter, page: Page) -> Result<Vec<Song>> {
        let songs = self.store.list(filter, page).await?;
        tracing::debug!(count = songs.len(), "Listed songs");
        Ok(songs)
    }

    /// Deletes a song.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::NotFound`] if the song is not stored
    /// - [`crate::Error::OperationFailed`] on storage faults
    #[instrument(skip(self), fields(operation = "songs.delete", key = %key))]
    pub async fn delete(&self, key: &SongKey) -> Result<()> {
        if !self.store.exists(key).await? || !self.store.delete(key).await? {
            return Err(key.not_found());
        }

        tracing::info!(group = key.group(), song = key.song(), "Song deleted");
        Ok(())
    }

    /// Renames a song and optionally replaces its verses.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::NotFound`] if `from` is not stored
    /// - [`crate::Error::AlreadyExists`] if `to` names a different stored song
    /// - [`crate::Error::OperationFailed`] on storage faults
    #[instrument(skip(self, verses), fields(operation = "songs.update", from = %from, to = %to))]
    pub async fn update(
        &self,
        from: &SongKey,
        to: &SongKey,
        verses: Option<Vec<String>>,
    ) -> Result<()> {
        if !self.store.exists(from).await? {
            return Err(from.not_found());
        }
        if from != to && self.store.exists(to).await? {
            return Err(to.already_exists());
        }
        if !self.store.rename(from, to, verses.as_deref()).await? {
            return Err(from.not_found());
        }

        tracing::info!(
            group = to.group(),
            song = to.song(),
            replaced_text = verses.is_some(),
            "Song updated"
        );
        Ok(())
    }

    /// Returns the window of a song's verses covered by `page`.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::NotFound`] if the song is not stored
    /// - [`crate::Error::OperationFailed`] on storage faults
    #[instrument(skip(self), fields(operation = "songs.text", key = %key))]
    pub async fn verses(&self, key: &SongKey, page: Page) -> Result<Vec<String>> {
        if !self.store.exists(key).await? {
            return Err(key.not_found());
        }

        self.store
            .verses(key, page)
            .await?
            .ok_or_else(|| key.not_found())
    }
}
