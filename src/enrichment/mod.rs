//! Song enrichment from an external metadata source.
//!
//! When a song is created the library asks a [`SongInfoProvider`] for its
//! release date, lyrics and link. [`HttpSongInfoClient`] talks to the
//! configured metadata endpoint; [`NoopSongInfo`] is used when no endpoint is
//! configured and leaves new songs without details.

mod http;
pub mod retry;

pub use http::HttpSongInfoClient;
pub use retry::{RetryExhausted, RetryPolicy};

use crate::Result;
use crate::models::split_verses;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Supplementary fields for a new song.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongDetails {
    /// Free-form release date.
    pub release_date: Option<String>,
    /// Lyric verses in order.
    pub verses: Vec<String>,
    /// External reference URL.
    pub link: Option<String>,
}

/// JSON body served by the metadata source.
///
/// `text` carries the whole lyric body with verses separated by blank lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongInfoPayload {
    /// Free-form release date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Lyric body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// External reference URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl From<SongInfoPayload> for SongDetails {
    fn from(payload: SongInfoPayload) -> Self {
        Self {
            release_date: payload.release_date.filter(|d| !d.is_empty()),
            verses: payload.text.as_deref().map(split_verses).unwrap_or_default(),
            link: payload.link.filter(|l| !l.is_empty()),
        }
    }
}

/// Source of supplementary song details.
#[async_trait]
pub trait SongInfoProvider: Send + Sync {
    /// Fetches details for `(group, song)`.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::UnknownSong`] if the source does not know the song
    /// - [`crate::Error::Upstream`] if the source is unreachable or failing
    async fn fetch(&self, group: &str, song: &str) -> Result<SongDetails>;
}

/// Provider used when enrichment is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSongInfo;

#[async_trait]
impl SongInfoProvider for NoopSongInfo {
    async fn fetch(&self, _group: &str, _song: &str) -> Result<SongDetails> {
        Ok(SongDetails::default())
    }
}
