//! Batched history iteration for exports
//!
//! Walks a query in fixed-size batches using a keyset cursor on
//! `(timestamp_start, id)`, so rows sharing a start time are neither
//! skipped nor repeated and memory stays bounded by one batch.

use std::sync::Arc;

use super::error::ExportError;
use super::query::HistoryQuery;
use super::source::{HistorySource, SortKey};
use crate::data::types::HistoryRow;

pub struct BatchIterator {
    source: Arc<dyn HistorySource>,
    query: HistoryQuery,
    batch_size: u32,
    cursor: Option<SortKey>,
    exhausted: bool,
    batches_fetched: u64,
    rows_yielded: u64,
}

impl BatchIterator {
    /// A zero batch size is treated as 1
    pub fn new(source: Arc<dyn HistorySource>, query: HistoryQuery, batch_size: u32) -> Self {
        Self {
            source,
            query,
            batch_size: batch_size.max(1),
            cursor: None,
            exhausted: false,
            batches_fetched: 0,
            rows_yielded: 0,
        }
    }

    /// Next non-empty batch, or `None` once the query is exhausted
    pub async fn next_batch(&mut self) -> Result<Option<Vec<HistoryRow>>, ExportError> {
        if self.exhausted {
            return Ok(None);
        }

        let rows = self
            .source
            .fetch_after(&self.query, self.cursor, self.batch_size)
            .await?;

        if rows.len() < self.batch_size as usize {
            self.exhausted = true;
        }
        let Some(last) = rows.last() else {
            return Ok(None);
        };

        self.cursor = Some(SortKey::of(last));
        self.batches_fetched += 1;
        self.rows_yielded += rows.len() as u64;

        tracing::trace!(
            batch = self.batches_fetched,
            rows = rows.len(),
            "Fetched history batch"
        );
        Ok(Some(rows))
    }

    pub fn batches_fetched(&self) -> u64 {
        self.batches_fetched
    }

    pub fn rows_yielded(&self) -> u64 {
        self.rows_yielded
    }
}
