//! Key/value persistence used by the engine for the ledger and settings blobs.

pub mod json_backend;
pub mod memory;

use crate::errors::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Abstraction over persistence backends that store UTF-8 blobs under string keys.
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when nothing has been stored under `key` yet.
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        (**self).save(key, value)
    }
}

pub use json_backend::JsonFileStore;
pub use memory::MemoryStore;
