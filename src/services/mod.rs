//! Business logic services.
//!
//! Services orchestrate the song store and the metadata provider.

mod library;

pub use library::SongLibrary;
