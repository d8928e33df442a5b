//! Key-Value Store Module - backing storage for experiment records
//!
//! Records are stored as opaque byte values under hierarchical string keys
//! (`experiment/<id>`, `response/<experiment-id>/<response-id>`). Listing a
//! collection is a prefix scan, so concurrent writers never contend on a
//! shared index entry.
//!
//! # Example
//!
//! ```rust,no_run
//! use sampling_lab::kv::{KvStore, MemoryKvStore};
//!
//! # async fn example() -> sampling_lab::Result<()> {
//! let store = MemoryKvStore::new();
//!
//! store.set("response/exp-1/a", b"{}".to_vec()).await?;
//! store.set("response/exp-1/b", b"{}".to_vec()).await?;
//! store.set("response/exp-2/c", b"{}".to_vec()).await?;
//!
//! let rows = store.scan_prefix("response/exp-1/").await?;
//! assert_eq!(rows.len(), 2);
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::MemoryKvStore;

use crate::Result;
use std::future::Future;

/// Async key-value store.
///
/// Every operation is atomic for a single key; there are no multi-key
/// transactions.
pub trait KvStore: Send + Sync {
    /// Get a value by key.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Set a value for a key.
    ///
    /// Overwrites any existing value.
    fn set(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Delete a key.
    ///
    /// No-op if the key doesn't exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// All entries whose key starts with `prefix`, sorted by key.
    fn scan_prefix(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<(String, Vec<u8>)>>> + Send;
}
