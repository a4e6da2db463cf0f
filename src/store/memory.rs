//! In-memory object store for development and testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{ObjectStore, ObjectSummary, PutCondition, PutOutcome, StoredObject};
use crate::canonical::content_version;

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MemoryStoreError {
    /// The store was switched offline.
    #[error("Object store unavailable")]
    Offline,
}

#[derive(Debug, Clone)]
struct Entry {
    body: Vec<u8>,
    content_type: String,
    version: String,
    last_modified: DateTime<Utc>,
}

/// In-memory object store.
///
/// Uses a BTreeMap so listings come back in key order, like S3. The store can
/// be switched offline to exercise backend failure paths.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<String, Entry>>,
    offline: AtomicBool,
}

impl InMemoryObjectStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object directly, with an explicit modification time.
    pub fn insert(&self, key: impl Into<String>, body: impl Into<Vec<u8>>, last_modified: DateTime<Utc>) {
        let body = body.into();
        let entry = Entry {
            version: content_version(&body),
            content_type: "application/octet-stream".to_string(),
            body,
            last_modified,
        };
        self.objects.write().insert(key.into(), entry);
    }

    /// Insert a JSON value.
    pub fn insert_json(&self, key: impl Into<String>, value: &serde_json::Value) {
        let body = serde_json::to_vec(value).unwrap_or_default();
        self.insert(key, body, Utc::now());
    }

    /// Read an object's bytes without going through the trait.
    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().get(key).map(|e| e.body.clone())
    }

    /// Read and decode a JSON object.
    pub fn json(&self, key: &str) -> Option<serde_json::Value> {
        self.body(key).and_then(|b| serde_json::from_slice(&b).ok())
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    fn check_online(&self) -> Result<(), MemoryStoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(MemoryStoreError::Offline)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    type Error = MemoryStoreError;

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, Self::Error> {
        self.check_online()?;
        Ok(self.objects.read().get(key).map(|e| StoredObject {
            body: e.body.clone(),
            version: Some(e.version.clone()),
            content_type: Some(e.content_type.clone()),
        }))
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        condition: PutCondition,
    ) -> Result<PutOutcome, Self::Error> {
        self.check_online()?;
        let mut objects = self.objects.write();

        let current = objects.get(key).map(|e| e.version.as_str());
        let allowed = match (&condition, current) {
            (PutCondition::Always, _) => true,
            (PutCondition::IfAbsent, None) => true,
            (PutCondition::IfAbsent, Some(_)) => false,
            (PutCondition::IfMatch(expected), Some(actual)) => expected == actual,
            (PutCondition::IfMatch(_), None) => false,
        };
        if !allowed {
            return Ok(PutOutcome::PreconditionFailed);
        }

        let version = content_version(&body);
        objects.insert(
            key.to_string(),
            Entry {
                body,
                content_type: content_type.to_string(),
                version: version.clone(),
                last_modified: Utc::now(),
            },
        );
        Ok(PutOutcome::Written { version: Some(version) })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Self::Error> {
        self.check_online()?;
        Ok(self
            .objects
            .read()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, e)| ObjectSummary {
                key: k.clone(),
                last_modified: e.last_modified,
            })
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), Self::Error> {
        self.check_online()?;
        self.objects.write().remove(key);
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemoryObjectStore::new();
        store
            .put("db/comments.json", b"[]".to_vec(), "application/json", PutCondition::Always)
            .await
            .unwrap();

        let object = store.get("db/comments.json").await.unwrap().unwrap();
        assert_eq!(object.body, b"[]");
        assert_eq!(object.content_type.as_deref(), Some("application/json"));
        assert!(store.get("db/missing.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_if_match_rejects_stale_version() {
        let store = InMemoryObjectStore::new();
        store.insert("k", b"one".to_vec(), Utc::now());
        let read = store.get("k").await.unwrap().unwrap();
        let version = read.version.unwrap();

        store.put("k", b"two".to_vec(), "text/plain", PutCondition::Always).await.unwrap();

        let outcome = store
            .put("k", b"three".to_vec(), "text/plain", PutCondition::IfMatch(version))
            .await
            .unwrap();
        assert_eq!(outcome, PutOutcome::PreconditionFailed);
        assert_eq!(store.body("k").unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_if_absent() {
        let store = InMemoryObjectStore::new();
        let first = store.put("k", b"a".to_vec(), "text/plain", PutCondition::IfAbsent).await.unwrap();
        let second = store.put("k", b"b".to_vec(), "text/plain", PutCondition::IfAbsent).await.unwrap();
        assert!(matches!(first, PutOutcome::Written { .. }));
        assert_eq!(second, PutOutcome::PreconditionFailed);
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let store = InMemoryObjectStore::new();
        store.insert("photos/b.jpg", b"b".to_vec(), Utc::now());
        store.insert("photos/a.jpg", b"a".to_vec(), Utc::now());
        store.insert("uploads/DOE_JOHN/profilePhoto1998", b"x".to_vec(), Utc::now());

        let keys: Vec<_> = store.list("photos/").await.unwrap().into_iter().map(|o| o.key).collect();
        assert_eq!(keys, vec!["photos/a.jpg", "photos/b.jpg"]);
    }

    #[tokio::test]
    async fn test_offline_fails_every_call() {
        let store = InMemoryObjectStore::new();
        store.set_offline(true);
        assert!(store.get("k").await.is_err());
        assert!(store.list("").await.is_err());
        assert!(!store.is_healthy().await);
        store.set_offline(false);
        assert!(store.get("k").await.is_ok());
    }
}
