use serde::Deserialize;

/// Which object storage provider receives uploads.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Aws,
    Gcp,
    /// Uploads are rejected with `STORAGE_UNAVAILABLE`.
    #[default]
    None,
}

/// AWS S3 bucket settings.
#[derive(Debug, Deserialize, Clone)]
pub struct AwsStorageConfig {
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Default: "us-east-1".
    #[serde(default = "default_aws_region")]
    pub region: String,
    #[serde(default)]
    pub bucket: Option<String>,
    /// Custom S3-compatible endpoint. Defaults to the regional AWS endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Overrides the host used to build public object URLs.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

/// Google Cloud Storage settings, accessed through its S3-interoperable XML API
/// with HMAC keys.
#[derive(Debug, Deserialize, Clone)]
pub struct GcpStorageConfig {
    #[serde(default)]
    pub hmac_access_key: Option<String>,
    #[serde(default)]
    pub hmac_secret: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    /// Default: "https://storage.googleapis.com".
    #[serde(default = "default_gcp_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub public_base_url: Option<String>,
}

/// App-level storage configuration shared by the server and its tests.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageAppConfig {
    #[serde(default)]
    pub provider: StorageProvider,
    /// Largest accepted upload in bytes. Default: 10 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    /// Lifetime of signed download URLs. Default: 3600 seconds.
    #[serde(default = "default_signed_url_expiry_secs")]
    pub signed_url_expiry_secs: u64,
    #[serde(default)]
    pub aws: AwsStorageConfig,
    #[serde(default)]
    pub gcp: GcpStorageConfig,
}

fn default_aws_region() -> String {
    "us-east-1".into()
}
fn default_gcp_endpoint() -> String {
    "https://storage.googleapis.com".into()
}
fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024
}
fn default_signed_url_expiry_secs() -> u64 {
    3600
}

impl Default for AwsStorageConfig {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            region: default_aws_region(),
            bucket: None,
            endpoint: None,
            public_base_url: None,
        }
    }
}

impl Default for GcpStorageConfig {
    fn default() -> Self {
        Self {
            hmac_access_key: None,
            hmac_secret: None,
            project_id: None,
            bucket: None,
            endpoint: default_gcp_endpoint(),
            public_base_url: None,
        }
    }
}

impl Default for StorageAppConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::default(),
            max_upload_size: default_max_upload_size(),
            signed_url_expiry_secs: default_signed_url_expiry_secs(),
            aws: AwsStorageConfig::default(),
            gcp: GcpStorageConfig::default(),
        }
    }
}
