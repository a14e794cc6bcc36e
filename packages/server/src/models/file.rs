use chrono::{DateTime, Utc};
use common::storage::ObjectInfo;
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::entity::file;

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "3f2a9c0d4b1e4f6a8c7d2e1f0a9b8c7d-beach")]
    pub identifier: String,
    #[schema(example = "beach.png")]
    pub filename: String,
    #[schema(example = "image/png")]
    pub content_type: String,
    /// Size in bytes.
    #[schema(example = 48213)]
    pub size: i64,
    pub blob_name: String,
    pub public_url: String,
    #[schema(example = "gcp")]
    pub provider: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<file::Model> for FileResponse {
    fn from(m: file::Model) -> Self {
        Self {
            id: m.id,
            identifier: m.identifier,
            filename: m.filename,
            content_type: m.content_type,
            size: m.size,
            blob_name: m.blob_name,
            public_url: m.public_url,
            provider: m.provider,
            is_deleted: m.is_deleted,
            created_at: m.created_at,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileListQuery {
    /// Rows to skip. Default: 0.
    pub skip: Option<u64>,
    /// Rows per page, 1-1000. Default: 100.
    pub limit: Option<u64>,
    /// Include soft-deleted files. Default: false.
    pub include_deleted: Option<bool>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SignedUrlQuery {
    /// Lifetime in seconds. Defaults to the configured expiry.
    pub expires_in: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SignedUrlResponse {
    pub url: String,
    /// Lifetime in seconds.
    #[schema(example = 3600)]
    pub expires_in: u64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ObjectListQuery {
    /// Only list object keys starting with this prefix.
    pub prefix: Option<String>,
}

/// Raw bucket listing entry.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BucketObjectResponse {
    #[schema(example = "0f3a9c2b7d4e4f1a8b6c5d4e3f2a1b0c_beach.png")]
    pub name: String,
    pub size: u64,
    pub last_modified: Option<String>,
}

impl From<ObjectInfo> for BucketObjectResponse {
    fn from(o: ObjectInfo) -> Self {
        Self {
            name: o.name,
            size: o.size,
            last_modified: o.last_modified,
        }
    }
}
