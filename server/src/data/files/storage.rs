//! Recording storage trait definition
//!
//! Defines the interface for blob backends holding broadcast recordings
//! (filesystem, S3).

use std::path::{Component, Path};
use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;

use super::error::FileStorageError;

/// Streaming handle to a stored recording
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

/// Stored object metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    /// Object size in bytes
    pub size_bytes: u64,
    /// Last modification time, when the backend reports one
    pub last_modified: Option<DateTime<Utc>>,
}

/// Trait for recording storage backends
///
/// All implementations must be thread-safe (Send + Sync) for use in async contexts.
/// Recordings are namespaced per station by the station's short name; `path`
/// is the value stored on the broadcast row and is always relative.
#[async_trait]
pub trait RecordingStorage: Send + Sync {
    /// Open a recording for streaming
    ///
    /// # Returns
    /// A reader over the object bytes, or `NotFound` if the object is missing
    async fn read_stream(&self, station: &str, path: &str)
    -> Result<BlobReader, FileStorageError>;

    /// Size and modification time of a recording
    async fn metadata(&self, station: &str, path: &str)
    -> Result<BlobMetadata, FileStorageError>;

    /// Best-effort MIME type; `None` when it cannot be determined
    async fn mimetype(&self, station: &str, path: &str) -> Option<String>;

    /// Delete a recording
    ///
    /// # Notes
    /// Does not fail if the object doesn't exist.
    async fn delete(&self, station: &str, path: &str) -> Result<(), FileStorageError>;
}

/// Reject paths that could escape the station namespace
///
/// Accepts only non-empty relative paths made of normal segments.
pub fn validate_relative_path(path: &str) -> Result<(), FileStorageError> {
    let invalid = |reason: &str| FileStorageError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.trim().is_empty() {
        return Err(invalid("path is empty"));
    }
    if path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute() {
        return Err(invalid("path must be relative"));
    }
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("path must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("path must be relative"));
            }
        }
    }
    Ok(())
}

/// Validate a station namespace (single path segment)
pub fn validate_station(station: &str) -> Result<(), FileStorageError> {
    if station.is_empty()
        || station == "."
        || station == ".."
        || station.contains('/')
        || station.contains('\\')
    {
        return Err(FileStorageError::InvalidPath {
            path: station.to_string(),
            reason: "station namespace must be a single segment".to_string(),
        });
    }
    Ok(())
}

/// Guess a MIME type from the file extension
pub fn guess_mimetype(path: &str) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}
