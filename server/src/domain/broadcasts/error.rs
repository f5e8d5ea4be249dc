//! Broadcast recording error types

use thiserror::Error;

use crate::data::DataError;
use crate::data::files::FileStorageError;
use crate::data::sqlite::SqliteError;

#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("Broadcast {id} not found")]
    NotFound { id: i64 },

    #[error("Streamer {id} not found")]
    StreamerNotFound { id: i64 },

    /// The broadcast exists but has no recording attached
    #[error("Broadcast {id} has no recording")]
    NoRecording { id: i64 },

    #[error("Recording storage error: {0}")]
    Storage(#[from] FileStorageError),

    #[error("Database error: {0}")]
    Data(#[from] DataError),
}

impl From<SqliteError> for BroadcastError {
    fn from(e: SqliteError) -> Self {
        Self::Data(e.into())
    }
}
