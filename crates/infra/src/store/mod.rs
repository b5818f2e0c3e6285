//! Flat, namespaced blob storage for job records and raw match sets.
//!
//! Keys are `/`-separated relative paths (`jobs/<id>.json`). The store is
//! last-write-wins and makes no transactional guarantees.

mod fs;
mod in_memory;

use async_trait::async_trait;
use thiserror::Error;

pub use fs::FsBlobStore;
pub use in_memory::InMemoryBlobStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Write `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Read the value under `key`; `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// All keys starting with `prefix`, sorted.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Rejects keys that could escape a directory root or collide with it.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
