//!
//! carepulse document store
//! ------------------------
//! This module defines the document-store boundary the rest of the crate is
//! written against: named collections of flat JSON documents with one-shot
//! reads/writes plus live-query subscriptions that push the entire current
//! result set on every change until cancelled.
//!
//! Key responsibilities:
//! - `DocumentStore`: the object-safe trait every backend implements.
//! - `MemoryStore`: the in-process reference backend used by the demo binary
//!   and the test suite.
//! - `SubscriptionHandle` / `SubscriptionSet`: idempotent cancellation, with a
//!   composite handle so a dashboard can release everything it opened at once.
//!
//! The public API centers around `SharedStore` (`Arc<dyn DocumentStore>`),
//! which is cloned freely and passed to the clinic operations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

mod memory;
pub mod query;
mod subscription;

pub use memory::MemoryStore;
pub use query::{Direction, Filter, Ordering, QueryDescriptor};
pub use subscription::{SubscriptionHandle, SubscriptionSet};

/// Flat field map of a stored document. Nested objects are allowed as values
/// (prescription medication lists use them) but matching and ordering only
/// look at top-level fields.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A document paired with its store-assigned id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document '{id}' not found in '{collection}'")]
    NotFound { collection: String, id: String },
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Snapshot delivery callback. Receives the entire current result set; the
/// consumer replaces its local cache, it never merges.
pub type SnapshotCallback = Arc<dyn Fn(&[Document]) + Send + Sync>;

pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert with a store-assigned id.
    fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Atomic create-if-absent under a caller-chosen id. Returns `false` when
    /// the id already exists (the existing document is left untouched).
    fn put_new(&self, collection: &str, id: &str, fields: Fields) -> Result<bool, StoreError>;

    /// Merge `patch` into an existing document. `NotFound` if it is absent.
    fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), StoreError>;

    /// Idempotent: deleting an absent document succeeds.
    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    fn query(&self, descriptor: &QueryDescriptor) -> Result<Vec<Document>, StoreError>;

    fn count(&self, descriptor: &QueryDescriptor) -> Result<usize, StoreError> {
        Ok(self.query(descriptor)?.len())
    }

    /// Open a live query. Fires once immediately with the current result set,
    /// then again after every mutation touching the collection. After the
    /// returned handle's `unsubscribe()` returns, no further deliveries occur.
    fn subscribe(&self, descriptor: QueryDescriptor, on_snapshot: SnapshotCallback) -> SubscriptionHandle;
}

pub type SharedStore = Arc<dyn DocumentStore>;

/// Write-time timestamp, epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
