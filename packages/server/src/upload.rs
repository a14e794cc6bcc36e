//! Upload pipeline: spool, sniff, store, record.

use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::PathBuf;

use axum::extract::DefaultBodyLimit;
use axum::extract::Multipart;
use axum::extract::multipart::Field;
use chrono::{DateTime, Utc};
use common::storage::{BoxReader, ObjectStore};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::entity::file;
use crate::error::AppError;
use crate::utils::filename::{file_stem, secure_filename};
use crate::utils::sniff::{SNIFF_LEN, sniff_image};
use crate::utils::token::random_hex_token;

/// A multipart file field written to a temporary file.
///
/// The temp file is removed when this value is dropped.
#[derive(Debug)]
pub struct SpooledUpload {
    path: PathBuf,
    pub filename: String,
    pub declared_content_type: Option<String>,
    pub size: u64,
}

impl SpooledUpload {
    pub async fn open(&self) -> Result<tokio::fs::File, AppError> {
        tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))
    }
}

impl Drop for SpooledUpload {
    fn drop(&mut self) {
        // Best effort.
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Stream a multipart field to a temp file, enforcing `max_size`.
pub async fn spool_field(
    mut field: Field<'_>,
    max_size: u64,
) -> Result<SpooledUpload, AppError> {
    let mut spooled = SpooledUpload {
        path: std::env::temp_dir().join(format!("voyage-upload-{}", Uuid::new_v4())),
        filename: field.file_name().unwrap_or_default().to_string(),
        declared_content_type: field.content_type().map(str::to_string),
        size: 0,
    };

    let mut temp_file = tokio::fs::File::create(&spooled.path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        spooled.size += chunk.len() as u64;
        if spooled.size > max_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {max_size} bytes"
            )));
        }
        temp_file
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
    }

    temp_file
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

    Ok(spooled)
}

/// Request body cap for multipart routes: the file limit plus form overhead.
pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = usize::try_from(max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(64 * 1024);
    DefaultBodyLimit::max(limit)
}

/// A multipart form with at most one spooled `file` part and text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<SpooledUpload>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Trimmed value of a text field; blank values count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Read every part of `multipart`, spooling the `file` part to disk.
///
/// A file part with no filename and no bytes (an empty form input) is
/// treated as absent.
pub async fn read_form(mut multipart: Multipart, max_size: u64) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "file" {
            let spooled = spool_field(field, max_size).await?;
            if spooled.size > 0 || !spooled.filename.is_empty() {
                form.file = Some(spooled);
            }
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

fn io_error(e: std::io::Error) -> AppError {
    AppError::Internal(format!("Upload source read failed: {e}"))
}

/// Validate, store and describe an upload without touching the database.
///
/// The content signature is checked before the store is consulted, so an
/// unsupported file never causes storage traffic.
pub async fn store_upload<R>(
    store: Option<&dyn ObjectStore>,
    mut source: R,
    filename: &str,
    declared_content_type: Option<&str>,
    now: DateTime<Utc>,
) -> Result<file::ActiveModel, AppError>
where
    R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
{
    let mut head = Vec::with_capacity(SNIFF_LEN);
    (&mut source)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .await
        .map_err(io_error)?;

    let kind = sniff_image(&head).ok_or_else(|| {
        AppError::UnsupportedFileType("Only JPEG, PNG or GIF images are allowed".into())
    })?;
    let store = store.ok_or(AppError::StorageUnavailable)?;

    let secure = secure_filename(filename);
    if let Some(declared) = declared_content_type
        && declared != kind.mime()
    {
        debug!(declared, detected = kind.mime(), "Declared content type ignored");
    }
    if let Some(guessed) = mime_guess::from_path(&secure).first_raw()
        && guessed != kind.mime()
    {
        warn!(filename = %secure, guessed, detected = kind.mime(), "Extension does not match content");
    }

    source.seek(SeekFrom::Start(0)).await.map_err(io_error)?;
    let size = tokio::io::copy(&mut source, &mut tokio::io::sink())
        .await
        .map_err(io_error)?;
    source.seek(SeekFrom::Start(0)).await.map_err(io_error)?;

    let object_name = format!("{}_{}", random_hex_token(), secure);
    let reader: BoxReader = Box::new(source);
    let stored = store.put_public(&object_name, reader, kind.mime()).await?;

    info!(
        provider = store.provider(),
        blob = %stored.name,
        size,
        "Stored upload"
    );

    Ok(file::ActiveModel {
        identifier: Set(format!("{}-{}", random_hex_token(), file_stem(&secure))),
        filename: Set(secure),
        content_type: Set(kind.mime().to_string()),
        size: Set(i64::try_from(size).unwrap_or(i64::MAX)),
        blob_name: Set(stored.name),
        public_url: Set(stored.public_url),
        provider: Set(store.provider().to_string()),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
}

/// Run the full pipeline and insert the `files` row.
#[instrument(skip(db, store, source, declared_content_type), fields(filename))]
pub async fn upload_file<C, R>(
    db: &C,
    store: Option<&dyn ObjectStore>,
    source: R,
    filename: &str,
    declared_content_type: Option<&str>,
) -> Result<file::Model, AppError>
where
    C: ConnectionTrait,
    R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
{
    let record = store_upload(store, source, filename, declared_content_type, Utc::now()).await?;
    let blob_name = record.blob_name.try_as_ref().cloned();

    match record.insert(db).await {
        Ok(model) => Ok(model),
        Err(err) => {
            // Remove the object that no row will ever point at.
            if let (Some(store), Some(name)) = (store, blob_name)
                && let Err(cleanup) = store.delete(&name).await
            {
                warn!(blob = %name, "Failed to remove orphaned upload: {cleanup}");
            }
            Err(err.into())
        }
    }
}

/// Convenience wrapper for a spooled multipart field.
pub async fn upload_spooled<C: ConnectionTrait>(
    db: &C,
    store: Option<&dyn ObjectStore>,
    spooled: &SpooledUpload,
) -> Result<file::Model, AppError> {
    let source = spooled.open().await?;
    upload_file(
        db,
        store,
        source,
        &spooled.filename,
        spooled.declared_content_type.as_deref(),
    )
    .await
}
