//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Extension, Router};
use tokio::net::TcpListener;

use super::middleware::{self, AllowedOrigins};
use super::routes::{broadcasts, health, history};
use crate::core::CoreApp;
use crate::core::config::HistoryConfig;
use crate::core::constants::DEFAULT_BODY_LIMIT;
use crate::data::SqliteService;
use crate::data::files::RecordingStorage;
use crate::domain::history::{ExportSettings, HistorySource};
use crate::domain::{BroadcastService, HistoryExporter};

/// Services shared by the HTTP handlers
#[derive(Clone)]
pub struct ApiServices {
    pub database: Arc<SqliteService>,
    pub exporter: HistoryExporter,
    pub broadcasts: BroadcastService,
    pub default_per_page: u32,
}

impl ApiServices {
    pub fn new(
        database: Arc<SqliteService>,
        recordings: Arc<dyn RecordingStorage>,
        history: &HistoryConfig,
    ) -> Self {
        let source: Arc<dyn HistorySource> = database.clone();
        Self {
            exporter: HistoryExporter::new(source, ExportSettings::from(history)),
            broadcasts: BroadcastService::new(database.clone(), recordings),
            default_per_page: history.default_per_page,
            database,
        }
    }
}

/// Build the full application router
pub fn router(services: ApiServices, allowed_origins: &AllowedOrigins) -> Router {
    let station_routes = history::routes(services.exporter, services.default_per_page)
        .merge(broadcasts::routes(
            services.broadcasts,
            services.default_per_page,
        ))
        .layer(Extension(services.database));

    Router::new()
        .route("/api/v1/health", get(health::health))
        .nest("/api/v1/station/{station_id}", station_routes)
        .fallback(middleware::handle_404)
        .layer(middleware::compression())
        .layer(middleware::cors(allowed_origins))
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .layer(middleware::trace())
}

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();
        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);

        let services = ApiServices::new(
            app.database.clone(),
            app.recordings.clone(),
            &app.config.history,
        );
        let router = router(services, &allowed_origins);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "API server listening");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::data::DataError;
    use crate::data::files::FilesystemStorage;
    use crate::data::sqlite::repositories::{
        create_broadcast, create_station, create_streamer, insert_song_history,
    };
    use crate::data::types::{HistoryRow, NewSongHistory, StationRow};
    use crate::domain::history::{HistoryQuery, SortKey};

    const BASE: i64 = 1_714_521_600; // 2024-05-01 00:00:00 UTC
    const DAY: &str = "start=2024-05-01&end=2024-05-01";

    struct TestApp {
        router: Router,
        db: Arc<SqliteService>,
        station: StationRow,
        recordings: TempDir,
    }

    async fn setup() -> TestApp {
        let db = Arc::new(SqliteService::in_memory().await.unwrap());
        let station = create_station(db.pool(), "Radio One", "radio_one", "UTC")
            .await
            .unwrap();
        for i in 1..=30 {
            let entry = NewSongHistory {
                station_id: station.id,
                timestamp_start: BASE + i * 60,
                listeners_start: Some(10),
                title: Some(format!("Song {i}")),
                artist: Some("Band".to_string()),
                ..Default::default()
            };
            insert_song_history(db.pool(), &entry).await.unwrap();
        }

        let recordings = TempDir::new().unwrap();
        let storage: Arc<dyn RecordingStorage> =
            Arc::new(FilesystemStorage::new(recordings.path().to_path_buf()));
        let services = ApiServices::new(db.clone(), storage, &HistoryConfig::default());
        let router = router(services, &AllowedOrigins::new("127.0.0.1", 5390));

        TestApp {
            router,
            db,
            station,
            recordings,
        }
    }

    async fn send(router: &Router, method: &str, uri: &str) -> Response {
        router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = setup().await;
        let response = send(&app.router, "GET", "/api/v1/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_history_json_page() {
        let app = setup().await;
        let uri = format!("/api/v1/station/{}/history?{DAY}&per_page=10&page=2", app.station.id);
        let response = send(&app.router, "GET", &uri).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["meta"]["total_items"], 30);
        assert_eq!(body["meta"]["total_pages"], 3);
        assert_eq!(body["data"].as_array().unwrap().len(), 10);
        // Newest first: page 2 starts at the 20th song
        assert_eq!(body["data"][0]["song"]["title"], "Song 20");
    }

    #[tokio::test]
    async fn test_history_by_short_name_with_search() {
        let app = setup().await;
        let uri = format!("/api/v1/station/radio_one/history?{DAY}&searchPhrase=song%203");
        let body = json(send(&app.router, "GET", &uri).await).await;
        // "Song 3" and "Song 30"
        assert_eq!(body["meta"]["total_items"], 2);
    }

    #[tokio::test]
    async fn test_history_unknown_station() {
        let app = setup().await;
        let response = send(&app.router, "GET", "/api/v1/station/nope/history").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["code"], "STATION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_history_invalid_range() {
        let app = setup().await;
        let uri = "/api/v1/station/radio_one/history?start=2024-05-02&end=2024-05-01";
        let response = send(&app.router, "GET", uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "INVALID_DATE_RANGE");

        let uri = "/api/v1/station/radio_one/history?start=yesterday-ish";
        let response = send(&app.router, "GET", uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_garbage_paging_is_normalized() {
        let app = setup().await;
        let uri = format!("/api/v1/station/radio_one/history?{DAY}&page=abc&per_page=-3");
        let response = send(&app.router, "GET", &uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["meta"]["page"], 1);
        assert_eq!(body["meta"]["per_page"], 25);
    }

    #[tokio::test]
    async fn test_history_csv_export_ignores_search() {
        let app = setup().await;
        let uri = format!("/api/v1/station/radio_one/history?{DAY}&format=csv&searchPhrase=Song%203");
        let response = send(&app.router, "GET", &uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"radio_one_timeline_2024-05-01_00-00-00_to_2024-05-01_23-59-59.csv\""
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

        let body = text(response).await;
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 31);
        assert!(lines[0].starts_with("Date,Time,Listeners"));
    }

    /// Serves the first keyset batch, then reports the pool as exhausted
    struct FailsAfterFirstBatch {
        inner: Arc<SqliteService>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HistorySource for FailsAfterFirstBatch {
        async fn count(&self, query: &HistoryQuery) -> Result<u64, DataError> {
            self.inner.count(query).await
        }

        async fn fetch_offset(
            &self,
            query: &HistoryQuery,
            offset: u64,
            limit: u32,
        ) -> Result<Vec<HistoryRow>, DataError> {
            self.inner.fetch_offset(query, offset, limit).await
        }

        async fn fetch_after(
            &self,
            query: &HistoryQuery,
            after: Option<SortKey>,
            limit: u32,
        ) -> Result<Vec<HistoryRow>, DataError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(DataError::PoolExhausted);
            }
            self.inner.fetch_after(query, after, limit).await
        }
    }

    #[tokio::test]
    async fn test_history_csv_failure_aborts_body() {
        let app = setup().await;
        let source = Arc::new(FailsAfterFirstBatch {
            inner: app.db.clone(),
            calls: AtomicUsize::new(0),
        });
        let recordings: Arc<dyn RecordingStorage> =
            Arc::new(FilesystemStorage::new(app.recordings.path().to_path_buf()));
        let services = ApiServices {
            database: app.db.clone(),
            exporter: HistoryExporter::new(
                source,
                ExportSettings {
                    max_duration: Duration::from_secs(5),
                    batch_size: 10,
                },
            ),
            broadcasts: BroadcastService::new(app.db.clone(), recordings),
            default_per_page: 25,
        };
        let router = router(services, &AllowedOrigins::new("127.0.0.1", 5390));

        let uri = format!("/api/v1/station/radio_one/history?{DAY}&format=csv");
        let response = send(&router, "GET", &uri).await;
        assert_eq!(response.status(), StatusCode::OK);

        // 30 rows exist but only the first batch of 10 was produced
        let result = to_bytes(response.into_body(), usize::MAX).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_broadcast_routes() {
        let app = setup().await;
        let pool = app.db.pool();
        let streamer = create_streamer(pool, app.station.id, "dj_night", None)
            .await
            .unwrap();
        let with_file = create_broadcast(
            pool,
            app.station.id,
            streamer.id,
            BASE,
            BASE + 3600,
            Some("shows/night.mp3"),
        )
        .await
        .unwrap();
        let without_file = create_broadcast(pool, app.station.id, streamer.id, BASE + 7200, 0, None)
            .await
            .unwrap();

        let dir = app.recordings.path().join("radio_one/shows");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("night.mp3"), b"ID3 audio bytes").unwrap();

        let base = format!("/api/v1/station/radio_one/streamer/{}/broadcasts", streamer.id);

        // List: newest first, links only with a recording
        let body = json(send(&app.router, "GET", &base).await).await;
        assert_eq!(body["meta"]["total_items"], 2);
        assert_eq!(body["data"][0]["id"], without_file.id);
        assert!(body["data"][0].get("links").is_none());
        assert!(body["data"][1]["links"]["download"].is_string());

        // Download
        let response = send(&app.router, "GET", &format!("{base}/{}/download", with_file.id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "15");
        assert_eq!(response.headers()["x-accel-buffering"], "no");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"night.mp3\""
        );
        assert_eq!(text(response).await, "ID3 audio bytes");

        // No recording
        let response =
            send(&app.router, "GET", &format!("{base}/{}/download", without_file.id)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "NO_RECORDING");

        // Delete removes the file; a second delete is a no-op success
        for _ in 0..2 {
            let response = send(&app.router, "DELETE", &format!("{base}/{}", with_file.id)).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(json(response).await["success"], true);
        }
        assert!(!dir.join("night.mp3").exists());

        // Unknown broadcast
        let response = send(&app.router, "DELETE", &format!("{base}/999")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["code"], "BROADCAST_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_download_missing_blob_is_not_found() {
        let app = setup().await;
        let pool = app.db.pool();
        let streamer = create_streamer(pool, app.station.id, "dj", None).await.unwrap();
        let broadcast = create_broadcast(
            pool,
            app.station.id,
            streamer.id,
            BASE,
            BASE + 60,
            Some("gone.mp3"),
        )
        .await
        .unwrap();

        let uri = format!(
            "/api/v1/station/radio_one/streamer/{}/broadcasts/{}/download",
            streamer.id, broadcast.id
        );
        let response = send(&app.router, "GET", &uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["code"], "RECORDING_MISSING");
    }

    #[tokio::test]
    async fn test_unknown_streamer() {
        let app = setup().await;
        let response = send(
            &app.router,
            "GET",
            "/api/v1/station/radio_one/streamer/42/broadcasts",
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["code"], "STREAMER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = setup().await;
        let response = send(&app.router, "GET", "/api/v1/nothing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
