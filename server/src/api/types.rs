//! Shared API types
//!
//! Error responses and the paginated envelope used by every endpoint.

use axum::Json;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::data::DataError;
use crate::data::files::FileStorageError;
use crate::domain::history::Page;
use crate::domain::{BroadcastError, ExportError};
use crate::utils::file::header_safe_filename;

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    ServiceUnavailable { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn from_data(e: DataError) -> Self {
        tracing::error!(error = %e, "Data error");
        if e.is_transient() {
            return Self::service_unavailable("Database temporarily unavailable");
        }
        Self::Internal {
            message: "Database operation failed".to_string(),
        }
    }

    pub fn from_export(e: ExportError) -> Self {
        match e {
            ExportError::InvalidDateRange(message) => {
                Self::bad_request("INVALID_DATE_RANGE", message)
            }
            ExportError::SourceUnavailable(e) => {
                tracing::error!(error = %e, "History source unavailable");
                Self::service_unavailable("History is temporarily unavailable")
            }
            ExportError::TimedOut { secs } => {
                tracing::warn!(secs, "History export timed out");
                Self::service_unavailable(format!("History export exceeded {}s", secs))
            }
            ExportError::SinkWrite(e) => {
                tracing::warn!(error = %e, "History export write failed");
                Self::internal("Failed to write export")
            }
        }
    }

    pub fn from_broadcast(e: BroadcastError) -> Self {
        match e {
            BroadcastError::NotFound { id } => {
                Self::not_found("BROADCAST_NOT_FOUND", format!("Broadcast not found: {}", id))
            }
            BroadcastError::StreamerNotFound { id } => {
                Self::not_found("STREAMER_NOT_FOUND", format!("Streamer not found: {}", id))
            }
            BroadcastError::NoRecording { id } => Self::bad_request(
                "NO_RECORDING",
                format!("Broadcast {} has no recording", id),
            ),
            BroadcastError::Storage(FileStorageError::NotFound { station, path }) => {
                tracing::warn!(station = %station, path = %path, "Recording missing from storage");
                Self::not_found("RECORDING_MISSING", "Recording file is missing from storage")
            }
            BroadcastError::Storage(e) => {
                tracing::error!(error = %e, "Recording storage error");
                Self::internal("Recording storage operation failed")
            }
            BroadcastError::Data(e) => Self::from_data(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "SERVICE_UNAVAILABLE".to_string(),
                message,
            ),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

/// Pagination metadata in response
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: u32, per_page: u32, total_items: u64) -> Self {
        Self {
            page,
            per_page,
            total_items,
            total_pages: total_items.div_ceil(u64::from(per_page.max(1))),
        }
    }
}

/// Generic paginated response wrapper
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total_items: u64) -> Self {
        Self {
            data,
            meta: PaginationMeta::new(page, per_page, total_items),
        }
    }
}

impl<T> From<Page<T>> for PaginatedResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self::new(page.items, page.page, page.per_page, page.total)
    }
}

/// `Content-Disposition` value for a file download
pub fn attachment_disposition(filename: &str) -> HeaderValue {
    let value = format!("attachment; filename=\"{}\"", header_safe_filename(filename));
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_date_range_is_bad_request() {
        let response =
            ApiError::from_export(ExportError::InvalidDateRange("bad start".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "INVALID_DATE_RANGE");
        assert_eq!(json["message"], "bad start");
    }

    #[test]
    fn test_timeout_is_service_unavailable() {
        let response = ApiError::from_export(ExportError::TimedOut { secs: 600 }).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_broadcast_error_codes() {
        let cases = [
            (
                BroadcastError::NotFound { id: 3 },
                StatusCode::NOT_FOUND,
                "BROADCAST_NOT_FOUND",
            ),
            (
                BroadcastError::StreamerNotFound { id: 9 },
                StatusCode::NOT_FOUND,
                "STREAMER_NOT_FOUND",
            ),
            (
                BroadcastError::NoRecording { id: 3 },
                StatusCode::BAD_REQUEST,
                "NO_RECORDING",
            ),
            (
                BroadcastError::Storage(FileStorageError::NotFound {
                    station: "one".into(),
                    path: "a.mp3".into(),
                }),
                StatusCode::NOT_FOUND,
                "RECORDING_MISSING",
            ),
            (
                BroadcastError::Storage(FileStorageError::Backend("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
            ),
        ];

        for (err, status, code) in cases {
            let response = ApiError::from_broadcast(err).into_response();
            assert_eq!(response.status(), status);
            assert_eq!(body_json(response).await["code"], code);
        }
    }

    #[test]
    fn test_pool_exhaustion_is_service_unavailable() {
        let response = ApiError::from_data(DataError::PoolExhausted).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_paginated_response_from_page() {
        let page = Page {
            items: vec![1, 2],
            total: 250,
            page: 3,
            per_page: 100,
        };
        let response = PaginatedResponse::from(page);
        assert_eq!(response.meta.total_pages, 3);
        assert_eq!(response.meta.per_page, 100);
        assert_eq!(response.data, vec![1, 2]);
    }

    #[test]
    fn test_attachment_disposition() {
        assert_eq!(
            attachment_disposition("show \"live\".mp3"),
            "attachment; filename=\"show _live_.mp3\""
        );
        assert_eq!(attachment_disposition("bad\nname"), "attachment; filename=\"bad_name\"");
    }

    #[test]
    fn test_pagination_meta_empty() {
        let meta = PaginationMeta::new(1, 25, 0);
        assert_eq!(meta.total_pages, 0);
    }
}
