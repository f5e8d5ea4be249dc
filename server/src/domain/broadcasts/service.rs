//! Broadcast recording operations

use std::sync::Arc;

use super::error::BroadcastError;
use crate::core::constants::FALLBACK_MIME_TYPE;
use crate::data::SqliteService;
use crate::data::files::{BlobReader, RecordingStorage};
use crate::data::sqlite::repositories::{
    clear_recording_path, get_broadcast, get_streamer, list_for_streamer,
};
use crate::data::types::{BroadcastRow, StationRow, StreamerRow};
use crate::utils::file::file_basename;

/// One page of a streamer's broadcasts
#[derive(Debug)]
pub struct BroadcastList {
    pub streamer: StreamerRow,
    pub items: Vec<BroadcastRow>,
    pub total: u64,
}

/// An open recording ready to be streamed to a client
pub struct RecordingDownload {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub reader: BlobReader,
}

impl std::fmt::Debug for RecordingDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingDownload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct BroadcastService {
    database: Arc<SqliteService>,
    storage: Arc<dyn RecordingStorage>,
}

impl BroadcastService {
    pub fn new(database: Arc<SqliteService>, storage: Arc<dyn RecordingStorage>) -> Self {
        Self { database, storage }
    }

    /// List a streamer's broadcasts, newest first
    pub async fn list(
        &self,
        station: &StationRow,
        streamer_id: i64,
        limit: u32,
        offset: u64,
    ) -> Result<BroadcastList, BroadcastError> {
        let streamer = get_streamer(self.database.pool(), station.id, streamer_id)
            .await?
            .ok_or(BroadcastError::StreamerNotFound { id: streamer_id })?;

        let (items, total) =
            list_for_streamer(self.database.pool(), station.id, streamer.id, limit, offset).await?;

        Ok(BroadcastList {
            streamer,
            items,
            total,
        })
    }

    /// Open a broadcast's recording for download
    ///
    /// Metadata is read before the stream is opened so a missing object
    /// surfaces as an error instead of an empty body.
    pub async fn download(
        &self,
        station: &StationRow,
        streamer_id: i64,
        broadcast_id: i64,
    ) -> Result<RecordingDownload, BroadcastError> {
        let broadcast = self.find(station, streamer_id, broadcast_id).await?;
        let path = broadcast
            .recording()
            .ok_or(BroadcastError::NoRecording { id: broadcast.id })?;

        let metadata = self.storage.metadata(&station.short_name, path).await?;
        let reader = self.storage.read_stream(&station.short_name, path).await?;
        let content_type = self
            .storage
            .mimetype(&station.short_name, path)
            .await
            .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());

        tracing::debug!(
            station = %station.short_name,
            broadcast_id,
            size_bytes = metadata.size_bytes,
            "Streaming broadcast recording"
        );

        Ok(RecordingDownload {
            filename: file_basename(path, "recording").to_string(),
            content_type,
            size_bytes: metadata.size_bytes,
            reader,
        })
    }

    /// Delete a broadcast's recording and clear its path
    ///
    /// Returns false when there was no recording to delete; storage is not
    /// touched in that case.
    pub async fn delete_recording(
        &self,
        station: &StationRow,
        streamer_id: i64,
        broadcast_id: i64,
    ) -> Result<bool, BroadcastError> {
        let broadcast = self.find(station, streamer_id, broadcast_id).await?;
        let Some(path) = broadcast.recording() else {
            return Ok(false);
        };

        self.storage.delete(&station.short_name, path).await?;

        let cleared = clear_recording_path(self.database.pool(), broadcast.id, path).await?;
        if cleared {
            tracing::info!(
                station = %station.short_name,
                broadcast_id,
                path,
                "Deleted broadcast recording"
            );
        } else {
            tracing::debug!(
                broadcast_id,
                path,
                "Recording path already changed by another request"
            );
        }
        Ok(true)
    }

    /// Broadcast by id, scoped to the station and streamer
    async fn find(
        &self,
        station: &StationRow,
        streamer_id: i64,
        broadcast_id: i64,
    ) -> Result<BroadcastRow, BroadcastError> {
        get_broadcast(self.database.pool(), station.id, broadcast_id)
            .await?
            .filter(|b| b.streamer_id == streamer_id)
            .ok_or(BroadcastError::NotFound { id: broadcast_id })
    }
}
