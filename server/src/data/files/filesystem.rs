//! Filesystem-based recording storage implementation
//!
//! Stores recordings on the local filesystem, one directory per station:
//! `{base_path}/{station_short_name}/{path}`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use super::error::FileStorageError;
use super::storage::{
    BlobMetadata, BlobReader, RecordingStorage, guess_mimetype, validate_relative_path,
    validate_station,
};

/// Filesystem-based recording storage
#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    /// Base path for recording storage
    base_path: PathBuf,
}

impl FilesystemStorage {
    /// Create a new filesystem storage with the given base path
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the full path for a recording
    ///
    /// Returns path like: `{base}/{station}/{path}`
    fn file_path(&self, station: &str, path: &str) -> Result<PathBuf, FileStorageError> {
        validate_station(station)?;
        validate_relative_path(path)?;
        Ok(self.base_path.join(station).join(path))
    }

    fn map_io(station: &str, path: &str, e: std::io::Error) -> FileStorageError {
        if e.kind() == std::io::ErrorKind::NotFound {
            FileStorageError::not_found(station, path)
        } else {
            FileStorageError::Io(e)
        }
    }

    /// Clean up empty parent directories after file deletion (best effort)
    async fn cleanup_empty_parents(&self, file_path: &Path) {
        let mut current = file_path.parent();

        // Walk up the tree, stopping at base_path
        while let Some(dir) = current {
            if dir == self.base_path || !dir.starts_with(&self.base_path) {
                break;
            }

            // Fails when the directory is not empty
            match fs::remove_dir(dir).await {
                Ok(_) => {
                    tracing::trace!(path = %dir.display(), "Removed empty directory");
                    current = dir.parent();
                }
                Err(_) => break,
            }
        }
    }
}

#[async_trait]
impl RecordingStorage for FilesystemStorage {
    async fn read_stream(
        &self,
        station: &str,
        path: &str,
    ) -> Result<BlobReader, FileStorageError> {
        let full_path = self.file_path(station, path)?;

        // Open directly; ENOENT maps to NotFound instead of a racy exists() check
        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| Self::map_io(station, path, e))?;

        tracing::trace!(station, path, "Recording opened");
        Ok(Box::pin(file))
    }

    async fn metadata(
        &self,
        station: &str,
        path: &str,
    ) -> Result<BlobMetadata, FileStorageError> {
        let full_path = self.file_path(station, path)?;
        let meta = fs::metadata(&full_path)
            .await
            .map_err(|e| Self::map_io(station, path, e))?;

        if !meta.is_file() {
            return Err(FileStorageError::not_found(station, path));
        }

        Ok(BlobMetadata {
            size_bytes: meta.len(),
            last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    async fn mimetype(&self, station: &str, path: &str) -> Option<String> {
        self.file_path(station, path).ok()?;
        guess_mimetype(path)
    }

    async fn delete(&self, station: &str, path: &str) -> Result<(), FileStorageError> {
        let full_path = self.file_path(station, path)?;

        match fs::remove_file(&full_path).await {
            Ok(()) => {
                tracing::debug!(station, path, "Recording deleted");
                self.cleanup_empty_parents(&full_path).await;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(station, path, "Recording already absent");
                Ok(())
            }
            Err(e) => Err(FileStorageError::Io(e)),
        }
    }
}
