//! SQLite repositories
//!
//! Row types (StationRow, HistoryRow, etc.) are imported from `crate::data::types`.

pub mod broadcast;
pub mod history;
pub mod station;
pub mod streamer;

pub use broadcast::{clear_recording_path, get_broadcast, list_for_streamer};
pub use history::{count_history, list_history, list_history_after};
pub use station::{get_by_short_name, get_station, resolve_station};
pub use streamer::get_streamer;

// Write helpers for seeding test databases
#[cfg(test)]
pub use broadcast::create_broadcast;
#[cfg(test)]
pub use history::insert_song_history;
#[cfg(test)]
pub use station::{create_playlist, create_request, create_station};
#[cfg(test)]
pub use streamer::create_streamer;
