//! In-memory song store.
//!
//! Used by tests and by `database.backend = "memory"` for local runs.

use crate::models::{Page, Song, SongFilter, SongKey};
use crate::storage::traits::SongStore;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Song store backed by a vector in process memory.
///
/// Uses `RwLock` for thread-safe access with reader-writer semantics.
#[derive(Debug, Default)]
pub struct MemorySongStore {
    songs: RwLock<Vec<Song>>,
}

impl MemorySongStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `songs`.
    #[must_use]
    pub fn with_songs(songs: impl IntoIterator<Item = Song>) -> Self {
        Self {
            songs: RwLock::new(songs.into_iter().collect()),
        }
    }

    /// Returns the number of stored songs.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// Returns true if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Song>>> {
        self.songs.read().map_err(|_| lock_error("memory_song_store_read"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Song>>> {
        self.songs.write().map_err(|_| lock_error("memory_song_store_write"))
    }
}

fn lock_error(operation: &str) -> Error {
    Error::operation(operation, "Lock poisoned")
}

fn position(songs: &[Song], key: &SongKey) -> Option<usize> {
    songs.iter().position(|s| s.key() == *key)
}

#[async_trait]
impl SongStore for MemorySongStore {
    async fn find(&self, key: &SongKey) -> Result<Option<Song>> {
        let songs = self.read()?;
        Ok(position(&songs, key).map(|i| songs[i].clone()))
    }

    async fn insert(&self, song: &Song) -> Result<()> {
        self.write()?.push(song.clone());
        Ok(())
    }

    async fn list(&self, filter: &SongFilter, page: Page) -> Result<Vec<Song>> {
        let mut matching: Vec<Song> = self
            .read()?
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| (&a.group, &a.song).cmp(&(&b.group, &b.song)));
        Ok(page.slice(&matching).to_vec())
    }

    async fn rename(
        &self,
        from: &SongKey,
        to: &SongKey,
        verses: Option<&[String]>,
    ) -> Result<bool> {
        let mut songs = self.write()?;
        let Some(index) = position(&songs, from) else {
            return Ok(false);
        };

        let song = &mut songs[index];
        song.group = to.group().to_string();
        song.song = to.song().to_string();
        if let Some(verses) = verses {
            song.text = verses.to_vec();
        }
        Ok(true)
    }

    async fn delete(&self, key: &SongKey) -> Result<bool> {
        let mut songs = self.write()?;
        let before = songs.len();
        songs.retain(|s| s.key() != *key);
        Ok(songs.len() < before)
    }

    async fn verses(&self, key: &SongKey, page: Page) -> Result<Option<Vec<String>>> {
        let songs = self.read()?;
        Ok(position(&songs, key).map(|i| page.slice(&songs[i].text).to_vec()))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(group: &str, song: &str) -> SongKey {
        SongKey::new(group, song).expect("valid key")
    }

    fn song(group: &str, title: &str, verses: &[&str]) -> Song {
        Song::new(&key(group, title)).with_text(verses.iter().map(ToString::to_string).collect())
    }

    #[tokio::test]
    async fn test_insert_then_find_case_insensitive() {
        let store = MemorySongStore::new();
        store
            .insert(&song("Muse", "Uprising", &["v0"]))
            .await
            .expect("insert");

        let found = store.find(&key("MUSE", "uprising")).await.expect("find");
        assert_eq!(found.map(|s| s.text), Some(vec!["v0".to_string()]));
        assert!(store.exists(&key("muse", "UPRISING")).await.expect("exists"));
        assert!(!store.exists(&key("muse", "starlight")).await.expect("exists"));
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_paged() {
        let store = MemorySongStore::with_songs([
            song("b", "two", &[]),
            song("a", "two", &[]),
            song("a", "one", &[]),
        ]);

        let page = store
            .list(&SongFilter::new(), Page::new(1, 5))
            .await
            .expect("list");
        let titles: Vec<(String, String)> =
            page.into_iter().map(|s| (s.group, s.song)).collect();
        assert_eq!(
            titles,
            vec![
                ("a".to_string(), "two".to_string()),
                ("b".to_string(), "two".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_rename_replaces_key_and_optionally_verses() {
        let store = MemorySongStore::with_songs([song("a", "one", &["x"])]);

        assert!(
            store
                .rename(&key("a", "one"), &key("b", "uno"), None)
                .await
                .expect("rename")
        );
        assert!(!store.exists(&key("a", "one")).await.expect("exists"));
        let renamed = store.find(&key("b", "uno")).await.expect("find");
        assert_eq!(renamed.map(|s| s.text), Some(vec!["x".to_string()]));

        let verses = vec!["y".to_string()];
        assert!(
            store
                .rename(&key("b", "uno"), &key("b", "uno"), Some(&verses))
                .await
                .expect("rename")
        );
        assert_eq!(
            store.verses(&key("b", "uno"), Page::new(0, 10)).await.expect("verses"),
            Some(verses)
        );

        assert!(
            !store
                .rename(&key("z", "z"), &key("y", "y"), None)
                .await
                .expect("rename")
        );
    }

    #[tokio::test]
    async fn test_delete_reports_missing() {
        let store = MemorySongStore::with_songs([song("a", "one", &[])]);
        assert!(!store.delete(&key("a", "two")).await.expect("delete"));
        assert_eq!(store.len().expect("len"), 1);
        assert!(store.delete(&key("a", "one")).await.expect("delete"));
        assert!(store.is_empty().expect("empty"));
    }

    #[tokio::test]
    async fn test_verses_window() {
        let store = MemorySongStore::with_songs([song("a", "one", &["v0", "v1", "v2", "v3"])]);

        let window = store.verses(&key("a", "one"), Page::new(1, 2)).await.expect("verses");
        assert_eq!(window, Some(vec!["v1".to_string(), "v2".to_string()]));

        let missing = store.verses(&key("a", "two"), Page::new(0, 2)).await.expect("verses");
        assert_eq!(missing, None);
    }
}
