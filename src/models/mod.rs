//! Data models for the music library.
//!
//! This module contains the song entity, its identity key and the list
//! filter and pagination types shared by storage and the HTTP layer.

mod filter;
mod song;

pub use filter::{Page, SongFilter};
pub use song::{Song, SongKey, VERSE_SEPARATOR, split_verses};
