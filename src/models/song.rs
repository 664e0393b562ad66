//! Song entity and identity key.

use crate::enrichment::SongDetails;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Separator between verses in a lyric body.
pub const VERSE_SEPARATOR: &str = "\n\n";

/// Splits a lyric body into verses on blank lines.
///
/// An empty body has no verses. Otherwise the body is split on every
/// [`VERSE_SEPARATOR`] and the pieces are kept in order.
///
/// # Examples
///
/// ```rust
/// use music_library::models::split_verses;
///
/// assert_eq!(split_verses("A\nB\n\nC\nD"), vec!["A\nB", "C\nD"]);
/// assert!(split_verses("").is_empty());
/// ```
#[must_use]
pub fn split_verses(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(VERSE_SEPARATOR).map(str::to_string).collect()
}

/// Identity of a song: the case-insensitive `(group, song)` pair.
///
/// Both parts are trimmed and lowercased on construction, so two keys built
/// from differently cased input compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SongKey {
    group: String,
    song: String,
}

impl SongKey {
    /// Creates a normalized key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either part is empty after trimming.
    pub fn new(group: &str, song: &str) -> Result<Self> {
        let group = normalize(group);
        let song = normalize(song);
        if group.is_empty() || song.is_empty() {
            return Err(Error::InvalidInput(
                "group and song value must be not empty".to_string(),
            ));
        }
        Ok(Self { group, song })
    }

    /// Returns the normalized group name.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the normalized song title.
    #[must_use]
    pub fn song(&self) -> &str {
        &self.song
    }

    /// Error for an operation on a pair that is not stored.
    #[must_use]
    pub fn not_found(&self) -> Error {
        Error::NotFound {
            group: self.group.clone(),
            song: self.song.clone(),
        }
    }

    /// Error for a write that would duplicate a stored pair.
    #[must_use]
    pub fn already_exists(&self) -> Error {
        Error::AlreadyExists {
            group: self.group.clone(),
            song: self.song.clone(),
        }
    }
}

impl fmt::Display for SongKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.group, self.song)
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// A song record.
///
/// Serialized with the field names clients use: `group`, `song`,
/// `releaseDate`, `text` and `link`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// Performing artist (lowercase).
    pub group: String,
    /// Track title (lowercase).
    pub song: String,
    /// Free-form release date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Lyric verses in order.
    #[serde(default)]
    pub text: Vec<String>,
    /// External reference URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Song {
    /// Creates a song with no details.
    #[must_use]
    pub fn new(key: &SongKey) -> Self {
        Self {
            group: key.group.clone(),
            song: key.song.clone(),
            release_date: None,
            text: Vec::new(),
            link: None,
        }
    }

    /// Creates a song from its key and the details fetched for it.
    #[must_use]
    pub fn with_details(key: &SongKey, details: SongDetails) -> Self {
        Self {
            group: key.group.clone(),
            song: key.song.clone(),
            release_date: details.release_date,
            text: details.verses,
            link: details.link,
        }
    }

    /// Sets the verses.
    #[must_use]
    pub fn with_text(mut self, verses: Vec<String>) -> Self {
        self.text = verses;
        self
    }

    /// Returns the identity key of this song.
    #[must_use]
    pub fn key(&self) -> SongKey {
        SongKey {
            group: normalize(&self.group),
            song: normalize(&self.song),
        }
    }
}
