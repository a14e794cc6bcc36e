use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

use super::error::StorageError;
use super::traits::{BoxReader, ObjectInfo, ObjectStore, StoredObject};

#[derive(Debug, Clone)]
struct MemoryObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// In-process object store for tests, behind the `test-util` feature.
///
/// Counts every trait call so callers can assert that no storage traffic
/// happened.
pub struct MemoryObjectStore {
    base_url: String,
    objects: Mutex<HashMap<String, MemoryObject>>,
    calls: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of trait methods invoked so far (excluding `provider` and `public_url`).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Stored bytes and content type for `name`, if present.
    pub async fn object(&self, name: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .lock()
            .await
            .get(name)
            .map(|o| (o.bytes.clone(), o.content_type.clone()))
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn provider(&self) -> &'static str {
        "memory"
    }

    async fn put_public(
        &self,
        name: &str,
        mut reader: BoxReader,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        self.record_call();
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        self.objects.lock().await.insert(
            name.to_string(),
            MemoryObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(StoredObject {
            name: name.to_string(),
            public_url: self.public_url(name),
        })
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }

    async fn signed_url(&self, name: &str, expires_in: Duration) -> Result<String, StorageError> {
        self.record_call();
        if !self.objects.lock().await.contains_key(name) {
            return Err(StorageError::NotFound(name.to_string()));
        }
        Ok(format!(
            "{}?expires_in={}",
            self.public_url(name),
            expires_in.as_secs()
        ))
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        self.record_call();
        Ok(self.objects.lock().await.remove(name).is_some())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        self.record_call();
        let objects = self.objects.lock().await;
        let mut listed: Vec<ObjectInfo> = objects
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, obj)| ObjectInfo {
                name: name.clone(),
                size: obj.bytes.len() as u64,
                last_modified: None,
            })
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }
}
