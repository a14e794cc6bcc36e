use thiserror::Error;

/// Errors that can occur during object storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The provider is not configured (missing bucket or credentials).
    #[error("object storage is not configured: {0}")]
    NotConfigured(String),
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(String),
    /// The remote service rejected the request.
    #[error("object storage request failed with status {status}: {message}")]
    Rejected { status: u16, message: String },
    /// Transport or client-side failure talking to the provider.
    #[error("object storage backend error: {0}")]
    Backend(String),
    /// An I/O error occurred while reading the upload source.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "object-storage")]
impl From<::s3::error::S3Error> for StorageError {
    fn from(err: ::s3::error::S3Error) -> Self {
        Self::Backend(err.to_string())
    }
}
