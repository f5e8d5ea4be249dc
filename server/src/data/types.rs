//! Row types shared by the repositories and the domain layer

use serde::{Deserialize, Serialize};

/// Station row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationRow {
    pub id: i64,
    pub name: String,
    /// URL-safe name; also the recording storage namespace
    pub short_name: String,
    /// IANA timezone name (e.g. "Europe/Berlin")
    pub timezone: String,
}

/// Streamer (DJ) row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamerRow {
    pub id: i64,
    pub station_id: i64,
    pub streamer_username: String,
    pub display_name: Option<String>,
}

impl StreamerRow {
    /// Display name, falling back to the username
    pub fn display(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.streamer_username)
    }
}

/// Broadcast row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastRow {
    pub id: i64,
    pub station_id: i64,
    pub streamer_id: i64,
    /// Unix seconds
    pub timestamp_start: i64,
    /// Unix seconds; 0 while the broadcast is live
    pub timestamp_end: i64,
    /// Relative path in recording storage
    pub recording_path: Option<String>,
}

impl BroadcastRow {
    /// Recording path when one is set and non-empty
    pub fn recording(&self) -> Option<&str> {
        self.recording_path.as_deref().filter(|p| !p.is_empty())
    }
}

/// One played track joined with its playlist, streamer and request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub id: i64,
    pub station_id: i64,
    /// Unix seconds
    pub timestamp_start: i64,
    /// Unix seconds; 0 while the track is playing
    pub timestamp_end: i64,
    pub duration: Option<i64>,
    pub listeners_start: Option<i64>,
    pub listeners_end: Option<i64>,
    pub delta_total: i64,
    pub text: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub playlist_name: Option<String>,
    pub streamer_name: Option<String>,
    pub request_id: Option<i64>,
    /// When the listener submitted the request (Unix seconds)
    pub requested_at: Option<i64>,
}

/// SQL-level history filter
///
/// Station and time bounds are mandatory; rows without `listeners_start`
/// are always excluded by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFilter {
    pub station_id: i64,
    /// Inclusive lower bound on `timestamp_start` (Unix seconds)
    pub start: i64,
    /// Inclusive upper bound on `timestamp_start` (Unix seconds)
    pub end: i64,
    /// Substring matched against title or artist
    pub search: Option<String>,
    pub descending: bool,
}

/// New song history entry
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct NewSongHistory {
    pub station_id: i64,
    pub timestamp_start: i64,
    pub timestamp_end: i64,
    pub duration: Option<i64>,
    pub listeners_start: Option<i64>,
    pub listeners_end: Option<i64>,
    pub delta_total: i64,
    pub text: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub playlist_id: Option<i64>,
    pub streamer_id: Option<i64>,
    pub request_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streamer_display_fallback() {
        let mut streamer = StreamerRow {
            id: 1,
            station_id: 1,
            streamer_username: "dj_night".to_string(),
            display_name: Some("Night Owl".to_string()),
        };
        assert_eq!(streamer.display(), "Night Owl");
        streamer.display_name = Some(String::new());
        assert_eq!(streamer.display(), "dj_night");
        streamer.display_name = None;
        assert_eq!(streamer.display(), "dj_night");
    }

    #[test]
    fn test_broadcast_recording_ignores_empty_path() {
        let mut broadcast = BroadcastRow {
            id: 1,
            station_id: 1,
            streamer_id: 1,
            timestamp_start: 0,
            timestamp_end: 0,
            recording_path: Some(String::new()),
        };
        assert_eq!(broadcast.recording(), None);
        broadcast.recording_path = Some("a.mp3".to_string());
        assert_eq!(broadcast.recording(), Some("a.mp3"));
    }
}
