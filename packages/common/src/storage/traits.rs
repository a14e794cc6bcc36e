use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncRead;

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Result of a successful public upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object key inside the bucket.
    pub name: String,
    /// Publicly readable URL of the object.
    pub public_url: String,
}

/// Listing entry returned by [`ObjectStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    pub name: String,
    pub size: u64,
    pub last_modified: Option<String>,
}

/// Cloud object storage holding uploaded media.
///
/// Implementations are shared across request tasks behind an `Arc`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short provider name persisted alongside file records (`aws`, `gcp`, ...).
    fn provider(&self) -> &'static str;

    /// Upload the whole stream under `name` with a public-read ACL.
    async fn put_public(
        &self,
        name: &str,
        reader: BoxReader,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;

    /// Public URL an object under `name` would be served from.
    fn public_url(&self, name: &str) -> String;

    /// Time-limited signed GET URL for a stored object.
    async fn signed_url(&self, name: &str, expires_in: Duration) -> Result<String, StorageError>;

    /// Delete an object. Returns `false` if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;

    /// List objects whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError>;
}
