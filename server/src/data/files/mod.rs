//! Recording storage layer
//!
//! Blob storage for broadcast recordings, separate from the relational store.
//!
//! ## Architecture
//!
//! - `storage` - Trait definition for recording storage backends
//! - `filesystem` - Local filesystem implementation
//! - `s3` - S3 / S3-compatible implementation
//! - `error` - Error types for storage operations
//!
//! ## Storage Layout
//!
//! Recordings are organized per station by short name:
//! ```text
//! {base_path or prefix}/
//! └── {station_short_name}/
//!     └── {recording_path}
//! ```

pub mod error;
pub mod filesystem;
pub mod s3;
pub mod storage;

use std::sync::Arc;

use crate::core::config::{RecordingsConfig, StorageBackend};
use crate::core::storage::{AppStorage, DataSubdir};
use crate::utils::file::expand_path;

pub use error::FileStorageError;
pub use filesystem::FilesystemStorage;
pub use s3::S3Storage;
pub use storage::{BlobMetadata, BlobReader, RecordingStorage};

/// Create the configured recording storage backend
///
/// This function is async because S3 storage initialization requires loading AWS config.
pub async fn open_recording_storage(
    config: &RecordingsConfig,
    app_storage: &AppStorage,
) -> Result<Arc<dyn RecordingStorage>, FileStorageError> {
    let storage: Arc<dyn RecordingStorage> = match config.storage {
        StorageBackend::S3 => {
            let s3_config = config.s3.as_ref().ok_or_else(|| {
                FileStorageError::Backend(
                    "S3 storage configured but no s3 config provided (missing bucket)".to_string(),
                )
            })?;

            let s3_storage = S3Storage::new(
                s3_config.bucket.clone(),
                s3_config.prefix.clone(),
                s3_config.region.clone(),
                s3_config.endpoint.clone(),
            )
            .await?;

            Arc::new(s3_storage)
        }
        StorageBackend::Filesystem => {
            let base_path = config
                .filesystem_path
                .as_ref()
                .map(|p| expand_path(p))
                .unwrap_or_else(|| app_storage.subdir(DataSubdir::Recordings));

            tracing::debug!(path = %base_path.display(), "Filesystem recording storage");
            Arc::new(FilesystemStorage::new(base_path))
        }
    };

    tracing::debug!(storage = %config.storage, "Recording storage initialized");
    Ok(storage)
}
