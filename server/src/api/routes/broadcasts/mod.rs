//! Streamer broadcast recording endpoints

pub mod types;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderName, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use tokio_util::io::ReaderStream;

use types::{BroadcastEntry, BroadcastPath, ListBroadcastsQuery, StatusResponse, StreamerPath};

use crate::api::extractors::StationScope;
use crate::api::types::{ApiError, PaginatedResponse, attachment_disposition};
use crate::core::constants::FALLBACK_MIME_TYPE;
use crate::domain::BroadcastService;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Shared state for Broadcast API endpoints
#[derive(Clone)]
pub struct BroadcastsApiState {
    pub service: BroadcastService,
    pub default_per_page: u32,
}

/// Build Broadcast API routes (nested under a station)
pub fn routes(service: BroadcastService, default_per_page: u32) -> Router<()> {
    let state = BroadcastsApiState {
        service,
        default_per_page,
    };

    Router::new()
        .route("/streamer/{streamer_id}/broadcasts", get(list_broadcasts))
        .route(
            "/streamer/{streamer_id}/broadcasts/{broadcast_id}",
            delete(delete_broadcast),
        )
        .route(
            "/streamer/{streamer_id}/broadcasts/{broadcast_id}/download",
            get(download_broadcast),
        )
        .with_state(state)
}

/// List a streamer's broadcasts, newest first
pub async fn list_broadcasts(
    State(state): State<BroadcastsApiState>,
    scope: StationScope,
    Path(path): Path<StreamerPath>,
    Query(query): Query<ListBroadcastsQuery>,
) -> Result<Json<PaginatedResponse<BroadcastEntry>>, ApiError> {
    let (page, per_page) = query.normalized(state.default_per_page);
    let offset = u64::from(page - 1) * u64::from(per_page);

    let list = state
        .service
        .list(&scope.station, path.streamer_id, per_page, offset)
        .await
        .map_err(ApiError::from_broadcast)?;

    tracing::debug!(
        station_id = scope.station.id,
        streamer = %list.streamer.display(),
        total = list.total,
        "Listed broadcasts"
    );

    let station_id = scope.station.id;
    let items = list
        .items
        .into_iter()
        .map(|row| BroadcastEntry::from_row(row, station_id))
        .collect();

    Ok(Json(PaginatedResponse::new(items, page, per_page, list.total)))
}

/// Stream a broadcast's recording
pub async fn download_broadcast(
    State(state): State<BroadcastsApiState>,
    scope: StationScope,
    Path(path): Path<BroadcastPath>,
) -> Result<Response, ApiError> {
    let download = state
        .service
        .download(&scope.station, path.streamer_id, path.broadcast_id)
        .await
        .map_err(ApiError::from_broadcast)?;

    let content_type = HeaderValue::from_str(&download.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_MIME_TYPE));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, HeaderValue::from(download.size_bytes)),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(&download.filename),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
            (X_ACCEL_BUFFERING, HeaderValue::from_static("no")),
        ],
        Body::from_stream(ReaderStream::new(download.reader)),
    )
        .into_response())
}

/// Delete a broadcast's recording
///
/// A broadcast without a recording is left untouched and still reports success.
pub async fn delete_broadcast(
    State(state): State<BroadcastsApiState>,
    scope: StationScope,
    Path(path): Path<BroadcastPath>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .service
        .delete_recording(&scope.station, path.streamer_id, path.broadcast_id)
        .await
        .map_err(ApiError::from_broadcast)?;

    Ok(Json(StatusResponse {
        success: true,
        message: "Changes saved successfully.",
    }))
}
