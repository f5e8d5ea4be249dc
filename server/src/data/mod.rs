//! Data storage layer
//!
//! - `sqlite` - Stations, streamers, broadcasts and song history
//! - `files` - Recording blob storage (filesystem or S3)
//! - `types` - Row types shared with the domain layer
//! - `error` - Unified error type for database access

pub mod error;
pub mod files;
pub mod sqlite;
pub mod types;

pub use error::DataError;
pub use sqlite::SqliteService;
pub use types::{BroadcastRow, HistoryFilter, HistoryRow, StationRow, StreamerRow};
