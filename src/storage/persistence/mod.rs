//! Song store implementations.

mod memory;
mod postgresql;

pub use memory::MemorySongStore;
pub use postgresql::{MIGRATIONS, PostgresSongStore};
