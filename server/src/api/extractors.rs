//! Path and validation extractors for API routes
//!
//! ## HTTP Caching Strategy
//!
//! | Endpoint Type        | Cache-Control | Additional           |
//! |----------------------|---------------|----------------------|
//! | History JSON         | -             | -                    |
//! | History CSV export   | `no-store`    | Content-Disposition  |
//! | Recording download   | `no-store`    | X-Accel-Buffering    |

use std::ops::Deref;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{FromRequestParts, Path, Query};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use chrono_tz::Tz;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::api::types::ApiError;
use crate::data::SqliteService;
use crate::data::sqlite::repositories::resolve_station;
use crate::data::types::StationRow;
use crate::utils::time::parse_timezone;

/// Maximum length of a station reference (numeric id or short name)
pub const MAX_STATION_REF_LENGTH: usize = 64;

/// Validate a station reference: 1-64 chars, alphanumeric + dash/underscore
pub fn is_valid_station_ref(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_STATION_REF_LENGTH
        && id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

#[derive(Debug, Deserialize)]
struct StationParams {
    station_id: String,
}

/// Station resolved from the `{station_id}` path segment
///
/// Accepts a numeric id or a short name. Every station-scoped query takes its
/// station id from here, never from caller-supplied query parameters.
#[derive(Debug, Clone)]
pub struct StationScope {
    pub station: StationRow,
    /// Station timezone; unknown names fall back to UTC
    pub tz: Tz,
}

/// Rejection type for [`StationScope`]
pub enum StationRejection {
    Path(ValidationRejection),
    Api(ApiError),
    /// Database handle not installed on the router
    MissingContext,
}

impl IntoResponse for StationRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Path(v) => v.into_response(),
            Self::Api(e) => e.into_response(),
            Self::MissingContext => {
                ApiError::internal("Database context not available").into_response()
            }
        }
    }
}

impl<S> FromRequestParts<S> for StationScope
where
    S: Send + Sync,
{
    type Rejection = StationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<StationParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| StationRejection::Path(ValidationRejection::Path(e)))?;

        if !is_valid_station_ref(&params.station_id) {
            return Err(StationRejection::Path(ValidationRejection::InvalidStationId));
        }

        let database = parts
            .extensions
            .get::<Arc<SqliteService>>()
            .cloned()
            .ok_or(StationRejection::MissingContext)?;

        let station = resolve_station(database.pool(), &params.station_id)
            .await
            .map_err(|e| StationRejection::Api(ApiError::from_data(e.into())))?
            .ok_or_else(|| {
                StationRejection::Api(ApiError::not_found(
                    "STATION_NOT_FOUND",
                    format!("Station not found: {}", params.station_id),
                ))
            })?;

        let tz = parse_timezone(Some(&station.timezone));
        tracing::trace!(station_id = station.id, tz = %tz, "Resolved station scope");

        Ok(Self { station, tz })
    }
}

/// Validation rejection with structured error response
pub enum ValidationRejection {
    /// Failed to parse path parameters
    Path(PathRejection),
    /// Invalid station_id format
    InvalidStationId,
    /// Failed to parse query string
    Query(QueryRejection),
    /// Validation constraints not satisfied
    Validation(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Path(rejection) => (
                StatusCode::BAD_REQUEST,
                "PATH_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::InvalidStationId => (
                StatusCode::BAD_REQUEST,
                "INVALID_STATION_ID",
                "Invalid station_id: must be 1-64 alphanumeric chars, dashes, or underscores"
                    .to_string(),
            ),
            Self::Query(rejection) => (
                StatusCode::BAD_REQUEST,
                "QUERY_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format_validation_errors(&errors),
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": "bad_request",
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: validation failed", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Query extractor with automatic validation.
///
/// Deserializes query parameters and validates them using the `validator` crate.
/// Returns a `ValidationRejection` on parse or validation failure.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T> Deref for ValidatedQuery<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Query)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_ref_validation() {
        assert!(is_valid_station_ref("12"));
        assert!(is_valid_station_ref("radio_one"));
        assert!(is_valid_station_ref("radio-one"));
        assert!(!is_valid_station_ref(""));
        assert!(!is_valid_station_ref("radio one"));
        assert!(!is_valid_station_ref("../etc"));
        assert!(!is_valid_station_ref(&"a".repeat(65)));
    }
}
