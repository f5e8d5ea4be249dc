//! Station history API endpoints

pub mod types;

use std::io;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use futures::{Stream, StreamExt};
use tokio::sync::oneshot;
use tokio_util::io::ReaderStream;

use types::{HistoryEntry, HistoryParams};

use crate::api::extractors::{StationScope, ValidatedQuery};
use crate::api::types::{ApiError, PaginatedResponse, attachment_disposition};
use crate::core::constants::HISTORY_EXPORT_PIPE_BYTES;
use crate::domain::history::{
    ExportError, ExportFormat, HistoryExporter, HistoryRequest, csv_filename, history_columns,
};

/// Shared state for History API endpoints
#[derive(Clone)]
pub struct HistoryApiState {
    pub exporter: HistoryExporter,
    pub default_per_page: u32,
}

/// Build History API routes (nested under a station)
pub fn routes(exporter: HistoryExporter, default_per_page: u32) -> Router<()> {
    let state = HistoryApiState {
        exporter,
        default_per_page,
    };

    Router::new()
        .route("/history", get(get_history))
        .with_state(state)
}

/// Played-track history for a station
///
/// `format=csv` streams the whole range as a download; anything else returns
/// one JSON page.
pub async fn get_history(
    State(state): State<HistoryApiState>,
    scope: StationScope,
    ValidatedQuery(params): ValidatedQuery<HistoryParams>,
) -> Result<Response, ApiError> {
    let request = HistoryRequest::parse(
        scope.station.id,
        &scope.tz,
        params.as_raw(),
        Utc::now(),
        state.default_per_page,
    )
    .map_err(ApiError::from_export)?;

    match request.format {
        ExportFormat::Json => {
            let tz = scope.tz;
            let page = state
                .exporter
                .page(&request.query, request.pagination, |row| {
                    HistoryEntry::from_row(row, &tz)
                })
                .await
                .map_err(ApiError::from_export)?;
            Ok(Json(PaginatedResponse::from(page)).into_response())
        }
        ExportFormat::Csv => Ok(stream_csv(state.exporter, scope, request)),
    }
}

/// Spawn the export into a bounded pipe and hand its reader to the client
///
/// The pipe bounds in-flight bytes; once the client goes away the next write
/// fails and the export task stops. Headers are already sent when the export
/// runs, so a failed export ends the body with an error and the response is
/// aborted instead of completing as a truncated file.
fn stream_csv(exporter: HistoryExporter, scope: StationScope, request: HistoryRequest) -> Response {
    let filename = csv_filename(
        &scope.station.short_name,
        request.query.range(),
        &scope.tz,
    );
    let (mut writer, reader) = tokio::io::duplex(HISTORY_EXPORT_PIPE_BYTES);
    let (done_tx, done_rx) = oneshot::channel();
    let tz = scope.tz;

    tracing::debug!(
        station_id = scope.station.id,
        filename = %filename,
        "Starting CSV export"
    );

    tokio::spawn(async move {
        let outcome = exporter
            .write_csv(request.query, &history_columns(), &tz, &mut writer)
            .await;
        // Receiver is gone when the client disconnected
        let _ = done_tx.send(outcome);
    });

    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, attachment_disposition(&filename)),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        Body::from_stream(export_body(ReaderStream::new(reader), done_rx)),
    )
        .into_response()
}

/// CSV bytes followed by the export outcome
///
/// The pipe reaches EOF when the export task drops its writer, whether it
/// finished or failed. The trailing item turns a failure into a stream error.
fn export_body<S>(
    bytes: S,
    done: oneshot::Receiver<Result<u64, ExportError>>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    let outcome = futures::stream::once(async move {
        let failure: Option<io::Result<Bytes>> = match done.await {
            Ok(Ok(_)) => None,
            Ok(Err(e)) => Some(Err(io::Error::other(format!("CSV export failed: {}", e)))),
            Err(_) => Some(Err(io::Error::other("CSV export task ended unexpectedly"))),
        };
        failure
    })
    .filter_map(futures::future::ready);

    bytes.chain(outcome)
}
