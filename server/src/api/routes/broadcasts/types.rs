//! Broadcast API types

use serde::{Deserialize, Serialize};

use crate::core::constants::MAX_PER_PAGE;
use crate::data::types::BroadcastRow;

/// Path parameters for streamer-scoped routes
///
/// `station_id` is resolved separately by the station extractor.
#[derive(Debug, Deserialize)]
pub struct StreamerPath {
    pub streamer_id: i64,
}

/// Path parameters for a single broadcast
#[derive(Debug, Deserialize)]
pub struct BroadcastPath {
    pub streamer_id: i64,
    pub broadcast_id: i64,
}

/// Paging parameters; garbage values fall back to defaults
#[derive(Debug, Default, Deserialize)]
pub struct ListBroadcastsQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl ListBroadcastsQuery {
    /// `(page, per_page)` with page >= 1 and per_page in `1..=MAX_PER_PAGE`
    pub fn normalized(&self, default_per_page: u32) -> (u32, u32) {
        let positive = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|s| s.trim().parse::<u32>().ok())
                .filter(|v| *v >= 1)
        };
        let page = positive(&self.page).unwrap_or(1);
        let per_page = positive(&self.per_page)
            .unwrap_or(default_per_page)
            .clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }
}

#[derive(Debug, Serialize)]
pub struct BroadcastLinks {
    pub download: String,
    pub delete: String,
}

/// One broadcast as returned by the list endpoint
#[derive(Debug, Serialize)]
pub struct BroadcastEntry {
    pub id: i64,
    pub streamer_id: i64,
    pub timestamp_start: i64,
    /// 0 while the broadcast is live
    pub timestamp_end: i64,
    pub recording_path: Option<String>,
    /// Present only when a recording exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<BroadcastLinks>,
}

impl BroadcastEntry {
    pub fn from_row(row: BroadcastRow, station_id: i64) -> Self {
        let links = row.recording().map(|_| {
            let base = format!(
                "/api/v1/station/{}/streamer/{}/broadcasts/{}",
                station_id, row.streamer_id, row.id
            );
            BroadcastLinks {
                download: format!("{}/download", base),
                delete: base,
            }
        });

        Self {
            id: row.id,
            streamer_id: row.streamer_id,
            timestamp_start: row.timestamp_start,
            timestamp_end: row.timestamp_end,
            recording_path: row.recording_path,
            links,
        }
    }
}

/// Response for mutations
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: &'static str,
}
