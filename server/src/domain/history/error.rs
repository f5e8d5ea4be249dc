//! History export error types

use thiserror::Error;

use crate::data::DataError;

/// Errors from history queries and exports
#[derive(Error, Debug)]
pub enum ExportError {
    /// A date bound could not be parsed, or start is after end
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// The backing store could not be queried
    #[error("History source unavailable: {0}")]
    SourceUnavailable(#[from] DataError),

    /// The output sink rejected a write (disk full, client went away)
    #[error("Failed to write export output: {0}")]
    SinkWrite(#[source] std::io::Error),

    /// The export ran past its configured time limit
    #[error("Export timed out after {secs}s")]
    TimedOut { secs: u64 },
}
