use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use tracing::{debug, info};

use super::error::StorageError;
use super::traits::{BoxReader, ObjectInfo, ObjectStore, StoredObject};
use crate::config::{AwsStorageConfig, GcpStorageConfig, StorageAppConfig, StorageProvider};

/// Longest lifetime S3 accepts for a V4 presigned URL (7 days).
const MAX_PRESIGN_SECS: u64 = 604_800;

/// Object store backed by an S3-compatible bucket.
///
/// Serves both AWS S3 and Google Cloud Storage (through the XML
/// interoperability endpoint with HMAC credentials).
pub struct BucketStore {
    provider: &'static str,
    /// Plain bucket handle for reads, deletes, listing and presigning.
    bucket: Box<Bucket>,
    /// Same bucket with the public-read ACL header attached to every request.
    upload_bucket: Box<Bucket>,
    public_base: String,
}

impl BucketStore {
    /// Build an AWS S3 store. Fails when bucket or credentials are missing.
    pub fn aws(cfg: &AwsStorageConfig) -> Result<Self, StorageError> {
        let bucket_name = required(cfg.bucket.as_deref(), "storage.aws.bucket")?;
        let access = required(cfg.access_key_id.as_deref(), "storage.aws.access_key_id")?;
        let secret = required(
            cfg.secret_access_key.as_deref(),
            "storage.aws.secret_access_key",
        )?;

        let endpoint = cfg
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", cfg.region));
        let region = Region::Custom {
            region: cfg.region.clone(),
            endpoint,
        };
        let public_base = cfg.public_base_url.clone().unwrap_or_else(|| {
            format!("https://{bucket_name}.s3.{}.amazonaws.com", cfg.region)
        });

        let (bucket, upload_bucket) =
            open_bucket(bucket_name, region, access, secret, "x-amz-acl", false)?;

        info!(bucket = bucket_name, region = %cfg.region, "AWS S3 object store ready");
        Ok(Self {
            provider: "aws",
            bucket,
            upload_bucket,
            public_base,
        })
    }

    /// Build a Google Cloud Storage store over the XML API.
    pub fn gcs(cfg: &GcpStorageConfig) -> Result<Self, StorageError> {
        let bucket_name = required(cfg.bucket.as_deref(), "storage.gcp.bucket")?;
        let access = required(cfg.hmac_access_key.as_deref(), "storage.gcp.hmac_access_key")?;
        let secret = required(cfg.hmac_secret.as_deref(), "storage.gcp.hmac_secret")?;

        let endpoint = cfg.endpoint.trim_end_matches('/').to_string();
        let region = Region::Custom {
            region: "auto".into(),
            endpoint: endpoint.clone(),
        };
        let public_base = cfg
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("{endpoint}/{bucket_name}"));

        let (bucket, upload_bucket) =
            open_bucket(bucket_name, region, access, secret, "x-goog-acl", true)?;

        info!(
            bucket = bucket_name,
            project = cfg.project_id.as_deref().unwrap_or("-"),
            "Google Cloud Storage object store ready"
        );
        Ok(Self {
            provider: "gcp",
            bucket,
            upload_bucket,
            public_base,
        })
    }
}

fn required<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, StorageError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(StorageError::NotConfigured(format!("{key} is not set"))),
    }
}

fn open_bucket(
    name: &str,
    region: Region,
    access: &str,
    secret: &str,
    acl_header: &str,
    path_style: bool,
) -> Result<(Box<Bucket>, Box<Bucket>), StorageError> {
    let credentials = Credentials::new(Some(access), Some(secret), None, None, None)
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

    let mut bucket = Bucket::new(name, region, credentials)?;
    if path_style {
        bucket = bucket.with_path_style();
    }

    let mut upload_bucket = bucket.clone();
    upload_bucket.add_header(acl_header, "public-read");

    Ok((bucket, upload_bucket))
}

/// Percent-encode an object key for use in a URL path, keeping `/`.
fn encode_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn check_status(status: u16, name: &str) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        Ok(())
    } else if status == 404 {
        Err(StorageError::NotFound(name.to_string()))
    } else {
        Err(StorageError::Rejected {
            status,
            message: format!("request for '{name}' was rejected"),
        })
    }
}

#[async_trait]
impl ObjectStore for BucketStore {
    fn provider(&self) -> &'static str {
        self.provider
    }

    async fn put_public(
        &self,
        name: &str,
        mut reader: BoxReader,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let response = self
            .upload_bucket
            .put_object_stream_with_content_type(&mut reader, name, content_type)
            .await?;
        check_status(response.status_code(), name)?;

        debug!(provider = self.provider, name, "Uploaded public object");
        Ok(StoredObject {
            name: name.to_string(),
            public_url: self.public_url(name),
        })
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.public_base.trim_end_matches('/'), encode_key(name))
    }

    async fn signed_url(&self, name: &str, expires_in: Duration) -> Result<String, StorageError> {
        let secs = expires_in.as_secs().clamp(1, MAX_PRESIGN_SECS) as u32;
        Ok(self.bucket.presign_get(name, secs, None).await?)
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let response = self.bucket.delete_object(name).await?;
        match response.status_code() {
            404 => Ok(false),
            status => check_status(status, name).map(|_| true),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let pages = self.bucket.list(prefix.to_string(), None).await?;
        Ok(pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|obj| ObjectInfo {
                name: obj.key,
                size: obj.size,
                last_modified: Some(obj.last_modified),
            })
            .collect())
    }
}

/// Construct the configured object store.
///
/// Returns `Ok(None)` when no provider is selected.
pub fn build_object_store(
    cfg: &StorageAppConfig,
) -> Result<Option<Arc<dyn ObjectStore>>, StorageError> {
    let store: Arc<dyn ObjectStore> = match cfg.provider {
        StorageProvider::None => return Ok(None),
        StorageProvider::Aws => Arc::new(BucketStore::aws(&cfg.aws)?),
        StorageProvider::Gcp => Arc::new(BucketStore::gcs(&cfg.gcp)?),
    };
    Ok(Some(store))
}
