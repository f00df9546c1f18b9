//! Storage traits and implementations
//!
//! Durable state is a flat key-value map. Backends implement
//! [`KeyValueStore`]; [`MarkerStore`] layers the typed marker fields on top.

mod markers;
mod memory;
mod sqlite;
mod traits;

pub use markers::{MarkerStore, keys};
pub use memory::InMemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;
pub use traits::KeyValueStore;
