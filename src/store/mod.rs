//! Object storage backends.
//!
//! The board keeps all state in named blobs: JSON collections under `db/`
//! and image bytes under `photos/` and `uploads/`. Backends offer whole-object
//! get, put, list-by-prefix and delete. No backend offers transactions; a put
//! may carry a version precondition so callers can opt into optimistic
//! concurrency.

pub mod memory;

#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A fetched object with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object bytes.
    pub body: Vec<u8>,
    /// Opaque version tag (an ETag for S3).
    pub version: Option<String>,
    /// Content type recorded at write time.
    pub content_type: Option<String>,
}

/// One entry of a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Full object key.
    pub key: String,
    /// Time of the last write.
    pub last_modified: DateTime<Utc>,
}

/// Precondition attached to a put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutCondition {
    /// Unconditional overwrite.
    Always,
    /// Only if the current version equals this one.
    IfMatch(String),
    /// Only if the object does not exist yet.
    IfAbsent,
}

/// Result of a put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// The object was written.
    Written {
        /// Version of the new object, when the backend reports one.
        version: Option<String>,
    },
    /// The precondition did not hold; nothing was written.
    PreconditionFailed,
}

/// Trait for object storage backends.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch an object; `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, Self::Error>;

    /// Write an object.
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        condition: PutCondition,
    ) -> Result<PutOutcome, Self::Error>;

    /// List objects whose key starts with `prefix`, in key order.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Self::Error>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), Self::Error>;

    /// Whether the backend is reachable.
    async fn is_healthy(&self) -> bool;
}

pub use memory::InMemoryObjectStore;

#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;
