//! History source abstraction
//!
//! The domain layer reads history through [`HistorySource`]. `SqliteService`
//! implements it on top of `data::sqlite::repositories::history`.

use async_trait::async_trait;

use super::query::{HistoryQuery, SortDirection};
use crate::data::sqlite::repositories::history;
use crate::data::types::{HistoryFilter, HistoryRow};
use crate::data::{DataError, SqliteService};

/// Position of a row in the `(timestamp_start, id)` ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub timestamp_start: i64,
    pub id: i64,
}

impl SortKey {
    pub fn of(row: &HistoryRow) -> Self {
        Self {
            timestamp_start: row.timestamp_start,
            id: row.id,
        }
    }
}

/// Read access to played-track history
///
/// Every method applies the full query: station, time range, search and
/// `listeners_start IS NOT NULL`. Results are ordered on
/// `(timestamp_start, id)` in the query's direction.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Count rows matching the query
    async fn count(&self, query: &HistoryQuery) -> Result<u64, DataError>;

    /// Fetch up to `limit` rows after skipping `offset`
    async fn fetch_offset(
        &self,
        query: &HistoryQuery,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<HistoryRow>, DataError>;

    /// Fetch up to `limit` rows strictly after `after` (from the start when `None`)
    async fn fetch_after(
        &self,
        query: &HistoryQuery,
        after: Option<SortKey>,
        limit: u32,
    ) -> Result<Vec<HistoryRow>, DataError>;
}

impl From<&HistoryQuery> for HistoryFilter {
    fn from(query: &HistoryQuery) -> Self {
        Self {
            station_id: query.station_id(),
            start: query.range().start().timestamp(),
            end: query.range().end().timestamp(),
            search: query.search().map(str::to_string),
            descending: query.direction() == SortDirection::Desc,
        }
    }
}

#[async_trait]
impl HistorySource for SqliteService {
    async fn count(&self, query: &HistoryQuery) -> Result<u64, DataError> {
        history::count_history(self.pool(), &query.into())
            .await
            .map_err(Into::into)
    }

    async fn fetch_offset(
        &self,
        query: &HistoryQuery,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<HistoryRow>, DataError> {
        history::list_history(self.pool(), &query.into(), offset, limit)
            .await
            .map_err(Into::into)
    }

    async fn fetch_after(
        &self,
        query: &HistoryQuery,
        after: Option<SortKey>,
        limit: u32,
    ) -> Result<Vec<HistoryRow>, DataError> {
        let cursor = after.map(|k| (k.timestamp_start, k.id));
        history::list_history_after(self.pool(), &query.into(), cursor, limit)
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// In-memory source with call counters
    #[derive(Default)]
    pub struct MemorySource {
        rows: Mutex<Vec<HistoryRow>>,
        fetches: AtomicUsize,
    }

    impl MemorySource {
        pub fn new(rows: Vec<HistoryRow>) -> Self {
            Self {
                rows: Mutex::new(rows),
                ..Default::default()
            }
        }

        pub fn fetch_calls(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn matching(&self, query: &HistoryQuery) -> Vec<HistoryRow> {
            let needle = query.search().map(str::to_lowercase);
            let mut rows: Vec<HistoryRow> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.station_id == query.station_id())
                .filter(|r| r.listeners_start.is_some())
                .filter(|r| query.range().contains_unix(r.timestamp_start))
                .filter(|r| match &needle {
                    None => true,
                    Some(n) => [&r.title, &r.artist].iter().any(|f| {
                        f.as_deref()
                            .is_some_and(|v| v.to_lowercase().contains(n.as_str()))
                    }),
                })
                .cloned()
                .collect();
            rows.sort_by_key(|r| (r.timestamp_start, r.id));
            if query.direction() == SortDirection::Desc {
                rows.reverse();
            }
            rows
        }
    }

    #[async_trait]
    impl HistorySource for MemorySource {
        async fn count(&self, query: &HistoryQuery) -> Result<u64, DataError> {
            Ok(self.matching(query).len() as u64)
        }

        async fn fetch_offset(
            &self,
            query: &HistoryQuery,
            offset: u64,
            limit: u32,
        ) -> Result<Vec<HistoryRow>, DataError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .matching(query)
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        }

        async fn fetch_after(
            &self,
            query: &HistoryQuery,
            after: Option<SortKey>,
            limit: u32,
        ) -> Result<Vec<HistoryRow>, DataError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let direction = query.direction();
            Ok(self
                .matching(query)
                .into_iter()
                .filter(|r| match after {
                    None => true,
                    Some(key) => {
                        let pos = (r.timestamp_start, r.id);
                        let cursor = (key.timestamp_start, key.id);
                        match direction {
                            SortDirection::Desc => pos < cursor,
                            SortDirection::Asc => pos > cursor,
                        }
                    }
                })
                .take(limit as usize)
                .collect())
        }
    }

    /// History row with the given id and start time, station 1
    pub fn row(id: i64, timestamp_start: i64) -> HistoryRow {
        HistoryRow {
            id,
            station_id: 1,
            timestamp_start,
            timestamp_end: timestamp_start + 180,
            duration: Some(180),
            listeners_start: Some(10),
            listeners_end: Some(12),
            delta_total: 2,
            text: Some(format!("Artist {id} - Song {id}")),
            title: Some(format!("Song {id}")),
            artist: Some(format!("Artist {id}")),
            playlist_name: Some("Default".to_string()),
            streamer_name: None,
            request_id: None,
            requested_at: None,
        }
    }

    /// `n` rows one minute apart starting at `base`
    pub fn rows(n: i64, base: i64) -> Vec<HistoryRow> {
        (1..=n).map(|i| row(i, base + i * 60)).collect()
    }
}
