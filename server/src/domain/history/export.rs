//! History export orchestration
//!
//! Picks the output path for a request: a paginated JSON page, or a CSV
//! stream fed by a [`BatchIterator`]. Both run under the configured time limit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::io::AsyncWrite;

use super::batch::BatchIterator;
use super::csv::{ColumnSpec, write_csv};
use super::error::ExportError;
use super::paginate::{Page, Pagination, paginate};
use super::query::{DateRange, HistoryQuery, SortDirection};
use super::source::HistorySource;
use crate::core::config::HistoryConfig;
use crate::data::types::HistoryRow;

/// Output format requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    /// `csv` (any case) selects CSV; anything else is JSON
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }

    /// Whether the free-text filter applies to this format
    ///
    /// CSV exports always cover the full range; only the JSON view narrows by search.
    pub fn applies_search(&self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Raw, untrusted request parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct RawHistoryParams<'a> {
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
    pub search_phrase: Option<&'a str>,
    pub format: Option<&'a str>,
    pub order: Option<&'a str>,
    pub page: Option<&'a str>,
    pub per_page: Option<&'a str>,
}

/// Validated history request
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub format: ExportFormat,
    pub query: HistoryQuery,
    pub pagination: Pagination,
}

impl HistoryRequest {
    /// Resolve raw parameters against the station's id and timezone
    pub fn parse(
        station_id: i64,
        tz: &Tz,
        raw: RawHistoryParams<'_>,
        now: DateTime<Utc>,
        default_per_page: u32,
    ) -> Result<Self, ExportError> {
        let format = ExportFormat::parse(raw.format);
        let range = DateRange::parse(raw.start, raw.end, tz, now)?;

        let mut builder = HistoryQuery::builder(station_id, range)
            .direction(SortDirection::parse(raw.order));
        if format.applies_search() {
            builder = builder.search(raw.search_phrase);
        } else if raw.search_phrase.is_some_and(|s| !s.trim().is_empty()) {
            tracing::debug!(station_id, "Search phrase ignored for CSV export");
        }

        Ok(Self {
            format,
            query: builder.build(),
            pagination: Pagination::from_raw(raw.page, raw.per_page, default_per_page),
        })
    }
}

/// Limits applied to every export
#[derive(Debug, Clone, Copy)]
pub struct ExportSettings {
    pub max_duration: Duration,
    pub batch_size: u32,
}

impl From<&HistoryConfig> for ExportSettings {
    fn from(config: &HistoryConfig) -> Self {
        Self {
            max_duration: Duration::from_secs(config.export_max_duration_secs),
            batch_size: config.export_batch_size,
        }
    }
}

/// Runs history reads against a source under [`ExportSettings`]
#[derive(Clone)]
pub struct HistoryExporter {
    source: Arc<dyn HistorySource>,
    settings: ExportSettings,
}

impl HistoryExporter {
    pub fn new(source: Arc<dyn HistorySource>, settings: ExportSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// One page of transformed rows
    pub async fn page<T, F>(
        &self,
        query: &HistoryQuery,
        pagination: Pagination,
        transform: F,
    ) -> Result<Page<T>, ExportError>
    where
        F: Fn(HistoryRow) -> T,
    {
        let work = paginate(self.source.as_ref(), query, pagination, transform);
        tokio::time::timeout(self.settings.max_duration, work)
            .await
            .map_err(|_| self.timed_out())?
    }

    /// Stream the whole query as CSV into `sink`; returns rows written
    pub async fn write_csv<W>(
        &self,
        query: HistoryQuery,
        columns: &[ColumnSpec],
        tz: &Tz,
        sink: &mut W,
    ) -> Result<u64, ExportError>
    where
        W: AsyncWrite + Unpin,
    {
        let started = Instant::now();
        let station_id = query.station_id();
        let mut iter = BatchIterator::new(self.source.clone(), query, self.settings.batch_size);

        let result = tokio::time::timeout(
            self.settings.max_duration,
            write_csv(&mut iter, columns, tz, sink),
        )
        .await
        .map_err(|_| self.timed_out())
        .and_then(|r| r);

        match &result {
            Ok(rows) => tracing::debug!(
                station_id,
                rows,
                batches = iter.batches_fetched(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "CSV export complete"
            ),
            Err(e) => tracing::warn!(
                station_id,
                rows = iter.rows_yielded(),
                error = %e,
                "CSV export aborted"
            ),
        }
        result
    }

    fn timed_out(&self) -> ExportError {
        ExportError::TimedOut {
            secs: self.settings.max_duration.as_secs(),
        }
    }
}
