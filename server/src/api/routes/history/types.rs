//! History API types

use chrono::SecondsFormat;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::data::types::HistoryRow;
use crate::domain::history::RawHistoryParams;
use crate::utils::time::unix_to_local;

/// Query parameters for the history endpoint
///
/// Everything is kept as a string: malformed paging or format values are
/// normalized downstream instead of rejected.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct HistoryParams {
    #[validate(length(max = 64, message = "start must be at most 64 characters"))]
    pub start: Option<String>,
    #[validate(length(max = 64, message = "end must be at most 64 characters"))]
    pub end: Option<String>,
    #[serde(rename = "searchPhrase")]
    #[validate(length(max = 256, message = "searchPhrase must be at most 256 characters"))]
    pub search_phrase: Option<String>,
    pub format: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl HistoryParams {
    pub fn as_raw(&self) -> RawHistoryParams<'_> {
        RawHistoryParams {
            start: self.start.as_deref(),
            end: self.end.as_deref(),
            search_phrase: self.search_phrase.as_deref(),
            format: self.format.as_deref(),
            order: self.order.as_deref(),
            page: self.page.as_deref(),
            per_page: self.per_page.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SongDto {
    pub text: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// One played track as returned by the JSON view
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub sh_id: i64,
    /// Unix seconds
    pub played_at: i64,
    /// Start time in the station timezone (RFC 3339)
    pub played_at_local: String,
    pub duration: Option<i64>,
    pub listeners_start: Option<i64>,
    pub listeners_end: Option<i64>,
    pub delta_total: i64,
    pub playlist: Option<String>,
    pub streamer: Option<String>,
    pub is_request: bool,
    /// Request submission time in the station timezone (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_at_local: Option<String>,
    pub song: SongDto,
}

impl HistoryEntry {
    pub fn from_row(row: HistoryRow, tz: &Tz) -> Self {
        Self {
            sh_id: row.id,
            played_at: row.timestamp_start,
            played_at_local: unix_to_local(row.timestamp_start, tz)
                .to_rfc3339_opts(SecondsFormat::Secs, false),
            duration: row.duration,
            listeners_start: row.listeners_start,
            listeners_end: row.listeners_end,
            delta_total: row.delta_total,
            playlist: row.playlist_name,
            streamer: row.streamer_name,
            is_request: row.request_id.is_some(),
            requested_at_local: row
                .requested_at
                .map(|ts| unix_to_local(ts, tz).to_rfc3339_opts(SecondsFormat::Secs, false)),
            song: SongDto {
                text: row.text,
                title: row.title,
                artist: row.artist,
            },
        }
    }
}
