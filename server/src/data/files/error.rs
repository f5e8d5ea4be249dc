//! Recording storage error types

use thiserror::Error;

/// Errors from low-level recording storage operations (filesystem/S3)
#[derive(Error, Debug)]
pub enum FileStorageError {
    #[error("Recording not found: {station}/{path}")]
    NotFound { station: String, path: String },

    #[error("Invalid recording path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl FileStorageError {
    pub(crate) fn not_found(station: &str, path: &str) -> Self {
        Self::NotFound {
            station: station.to_string(),
            path: path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = FileStorageError::not_found("radio_one", "2024/show.mp3");
        assert_eq!(err.to_string(), "Recording not found: radio_one/2024/show.mp3");
    }

    #[test]
    fn test_invalid_path_display() {
        let err = FileStorageError::InvalidPath {
            path: "../x".to_string(),
            reason: "path must not contain '..'".to_string(),
        };
        assert!(err.to_string().contains("../x"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let storage_err: FileStorageError = io_err.into();
        assert!(storage_err.to_string().contains("denied"));
    }
}
