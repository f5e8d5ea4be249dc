//! Domain logic for the station API
//!
//! - `history` - Played-track history: filtering, pagination and CSV export
//! - `broadcasts` - Streamer broadcast recordings over blob storage
//!
//! The two modules share no state; each reaches the data layer on its own.

pub mod broadcasts;
pub mod history;

pub use broadcasts::{BroadcastError, BroadcastService};
pub use history::{ExportError, HistoryExporter};
