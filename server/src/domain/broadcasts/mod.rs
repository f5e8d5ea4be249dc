//! Streamer broadcast recordings: listing, download and deletion
//!
//! Broadcast rows live in SQLite; the recordings themselves live in the
//! configured [`RecordingStorage`](crate::data::files::RecordingStorage),
//! namespaced by station short name.

mod error;
mod service;

pub use error::BroadcastError;
pub use service::{BroadcastList, BroadcastService, RecordingDownload};
