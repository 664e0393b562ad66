//! Request and response bodies.
//!
//! Query and body fields are all optional at the serde level so that a
//! missing field and an empty one produce the same validation message.

use crate::models::{Page, Song, SongFilter, SongKey, split_verses};
use crate::Result;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query string naming one song (`?group=..&song=..`).
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SongKeyQuery {
    /// Group name.
    pub group: Option<String>,
    /// Song title.
    pub song: Option<String>,
}

impl SongKeyQuery {
    /// Validates and normalizes the key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if either part is missing or
    /// empty.
    pub fn key(&self) -> Result<SongKey> {
        SongKey::new(
            self.group.as_deref().unwrap_or_default(),
            self.song.as_deref().unwrap_or_default(),
        )
    }
}

/// Query string for `GET /songs`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListSongsQuery {
    /// Number of songs to skip (required, non-negative integer).
    pub offset: Option<String>,
    /// Maximum number of songs (required, non-negative integer).
    pub limit: Option<String>,
    /// Group filter.
    pub group: Option<String>,
    /// Song filter.
    pub song: Option<String>,
    /// Release date filter.
    pub release_date: Option<String>,
    /// Lyric substring filter, matched against the verses joined without a
    /// separator.
    pub text: Option<String>,
    /// Link filter.
    pub link: Option<String>,
}

impl ListSongsQuery {
    /// Returns the requested page.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if offset or limit is missing or
    /// not a non-negative integer.
    pub fn page(&self) -> Result<Page> {
        Page::parse(self.offset.as_deref(), self.limit.as_deref())
    }

    /// Returns the filter built from the optional fields.
    #[must_use]
    pub fn filter(&self) -> SongFilter {
        let mut filter = SongFilter::new();
        if let Some(group) = &self.group {
            filter = filter.with_group(group);
        }
        if let Some(song) = &self.song {
            filter = filter.with_song(song);
        }
        if let Some(release_date) = &self.release_date {
            filter = filter.with_release_date(release_date.as_str());
        }
        if let Some(text) = &self.text {
            filter = filter.with_text(text.as_str());
        }
        if let Some(link) = &self.link {
            filter = filter.with_link(link.as_str());
        }
        filter
    }
}

/// Query string for `GET /songs/text`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SongTextQuery {
    /// Group name.
    pub group: Option<String>,
    /// Song title.
    pub song: Option<String>,
    /// Index of the first verse (required, non-negative integer).
    pub offset: Option<String>,
    /// Maximum number of verses (required, non-negative integer).
    pub limit: Option<String>,
}

impl SongTextQuery {
    /// Validates the key and page together.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] describing the first problem.
    pub fn parts(&self) -> Result<(SongKey, Page)> {
        let key = SongKey::new(
            self.group.as_deref().unwrap_or_default(),
            self.song.as_deref().unwrap_or_default(),
        )?;
        let page = Page::parse(self.offset.as_deref(), self.limit.as_deref())?;
        Ok((key, page))
    }
}

/// Body of `POST /songs`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateSongRequest {
    /// Group name.
    #[serde(default)]
    pub group: String,
    /// Song title.
    #[serde(default)]
    pub song: String,
}

/// Body of `PUT /songs`.
///
/// `text`, when present, replaces the lyric body; verses are separated by a
/// blank line, as in the metadata source.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateSongRequest {
    /// New group name.
    #[serde(default)]
    pub group: String,
    /// New song title.
    #[serde(default)]
    pub song: String,
    /// New lyric body.
    pub text: Option<String>,
}

impl UpdateSongRequest {
    /// Validates the new key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if either part is empty.
    pub fn key(&self) -> Result<SongKey> {
        SongKey::new(&self.group, &self.song)
    }

    /// Returns the replacement verses, if any.
    #[must_use]
    pub fn verses(&self) -> Option<Vec<String>> {
        self.text.as_deref().map(split_verses)
    }
}

/// `{ "message": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{ "songs": [...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SongsResponse {
    /// Matching songs.
    pub songs: Vec<Song>,
}

/// `{ "verses": [...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VersesResponse {
    /// Requested verses.
    pub verses: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_builds_filter() {
        let query: ListSongsQuery = serde_json::from_value(serde_json::json!({
            "offset": "0",
            "limit": "5",
            "group": "Muse",
            "releaseDate": "",
            "text": "love",
        }))
        .expect("valid query");

        let filter = query.filter();
        assert_eq!(filter.group.as_deref(), Some("muse"));
        assert_eq!(filter.release_date, None);
        assert_eq!(filter.text.as_deref(), Some("love"));
        assert_eq!(query.page().expect("page"), Page::new(0, 5));
    }

    #[test]
    fn test_text_query_requires_everything() {
        let query = SongTextQuery {
            group: Some("a".to_string()),
            song: Some("b".to_string()),
            offset: Some("1".to_string()),
            limit: None,
        };
        assert!(query.parts().is_err());
    }

    #[test]
    fn test_update_request_verses() {
        let body: UpdateSongRequest =
            serde_json::from_str(r#"{"group":"a","song":"b","text":"x\n\ny"}"#).expect("body");
        assert_eq!(body.verses(), Some(vec!["x".to_string(), "y".to_string()]));

        let body: UpdateSongRequest =
            serde_json::from_str(r#"{"group":"a","song":"b"}"#).expect("body");
        assert_eq!(body.verses(), None);
    }

    #[test]
    fn test_missing_body_fields_default_to_empty() {
        let body: CreateSongRequest = serde_json::from_str("{}").expect("body");
        assert!(SongKey::new(&body.group, &body.song).is_err());
    }
}
