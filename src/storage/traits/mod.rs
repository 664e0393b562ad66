//! Storage backend traits.

mod song;

pub use song::SongStore;
