//! Storage trait definitions

use anyhow::Result;

/// Flat key-value storage for durable markers
///
/// Values are opaque strings; typing and encoding live in
/// [`MarkerStore`](super::MarkerStore). Every key is independently readable
/// and writable, so backends need no schema knowledge.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never written or was removed
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Succeeds if the key does not exist.
    fn remove(&self, key: &str) -> Result<()>;

    /// Delete every key (data wipe)
    fn clear(&self) -> Result<()>;
}
