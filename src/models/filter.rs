//! List filters and pagination.

use super::Song;
use crate::{Error, Result};

/// Optional filters for listing songs.
///
/// Empty values are treated as absent. `group` and `song` are lowercased so
/// they compare against normalized stored values; the other fields are
/// matched exactly as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongFilter {
    /// Exact group name.
    pub group: Option<String>,
    /// Exact song title.
    pub song: Option<String>,
    /// Exact release date text.
    pub release_date: Option<String>,
    /// Case-sensitive substring of the verses concatenated without a
    /// separator.
    pub text: Option<String>,
    /// Exact link.
    pub link: Option<String>,
}

impl SongFilter {
    /// Creates an empty filter (matches all).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            group: None,
            song: None,
            release_date: None,
            text: None,
            link: None,
        }
    }

    /// Filters by group name.
    #[must_use]
    pub fn with_group(mut self, group: impl AsRef<str>) -> Self {
        self.group = present(group.as_ref().trim().to_lowercase());
        self
    }

    /// Filters by song title.
    #[must_use]
    pub fn with_song(mut self, song: impl AsRef<str>) -> Self {
        self.song = present(song.as_ref().trim().to_lowercase());
        self
    }

    /// Filters by release date.
    #[must_use]
    pub fn with_release_date(mut self, release_date: impl Into<String>) -> Self {
        self.release_date = present(release_date.into());
        self
    }

    /// Filters by a substring of the lyric body.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = present(text.into());
        self
    }

    /// Filters by link.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = present(link.into());
        self
    }

    /// Returns true if the filter is empty (matches all).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.group.is_none()
            && self.song.is_none()
            && self.release_date.is_none()
            && self.text.is_none()
            && self.link.is_none()
    }

    /// Returns true if the song satisfies every present filter.
    #[must_use]
    pub fn matches(&self, song: &Song) -> bool {
        let equals = |filter: &Option<String>, value: Option<&str>| {
            filter.as_deref().is_none_or(|f| value == Some(f))
        };

        equals(&self.group, Some(song.group.as_str()))
            && equals(&self.song, Some(song.song.as_str()))
            && equals(&self.release_date, song.release_date.as_deref())
            && equals(&self.link, song.link.as_deref())
            && self
                .text
                .as_deref()
                .is_none_or(|needle| song.text.concat().contains(needle))
    }
}

fn present(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Offset/limit pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Number of items to skip.
    pub offset: u32,
    /// Maximum number of items to return.
    pub limit: u32,
}

impl Page {
    /// Creates a page.
    #[must_use]
    pub const fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Parses a page from raw query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either value is missing, empty, or
    /// not a non-negative integer.
    pub fn parse(offset: Option<&str>, limit: Option<&str>) -> Result<Self> {
        let (Some(offset), Some(limit)) = (non_empty(offset), non_empty(limit)) else {
            return Err(Error::InvalidInput(
                "offset and limit value must be not empty".to_string(),
            ));
        };

        Ok(Self {
            offset: parse_count("offset", offset)?,
            limit: parse_count("limit", limit)?,
        })
    }

    /// Returns the window of `items` this page covers.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.offset as usize).min(items.len());
        let end = start.saturating_add(self.limit as usize).min(items.len());
        &items[start..end]
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_count(name: &str, value: &str) -> Result<u32> {
    value.parse::<u32>().map_err(|_| {
        Error::InvalidInput(format!("{name} value must be a non-negative number"))
    })
}
