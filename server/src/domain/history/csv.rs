//! CSV rendering of history rows
//!
//! Rows are pulled batch by batch and written to the sink as each batch is
//! encoded, so a client sees the header and first rows long before the
//! query is exhausted.

use chrono_tz::Tz;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::batch::BatchIterator;
use super::error::ExportError;
use super::query::DateRange;
use crate::data::types::HistoryRow;
use crate::utils::time::unix_to_local;

/// Column value extractor; timestamps are rendered in the given zone
pub type Extract = fn(&HistoryRow, &Tz) -> String;

/// One output column: a header and how to fill it
#[derive(Clone, Copy)]
pub struct ColumnSpec {
    pub header: &'static str,
    pub extract: Extract,
}

impl std::fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Columns of the timeline export, in output order
pub fn history_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec {
            header: "Date",
            extract: |row, tz| {
                unix_to_local(row.timestamp_start, tz)
                    .format("%Y-%m-%d")
                    .to_string()
            },
        },
        ColumnSpec {
            header: "Time",
            extract: |row, tz| {
                unix_to_local(row.timestamp_start, tz)
                    .format("%-I:%M%P")
                    .to_string()
            },
        },
        ColumnSpec {
            header: "Listeners",
            extract: |row, _| {
                row.listeners_start
                    .map(|l| l.to_string())
                    .unwrap_or_default()
            },
        },
        ColumnSpec {
            header: "Delta",
            extract: |row, _| row.delta_total.to_string(),
        },
        ColumnSpec {
            header: "Track",
            extract: |row, _| {
                row.title
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .or(row.text.as_deref())
                    .unwrap_or_default()
                    .to_string()
            },
        },
        ColumnSpec {
            header: "Artist",
            extract: |row, _| opt(&row.artist),
        },
        ColumnSpec {
            header: "Playlist",
            extract: |row, _| opt(&row.playlist_name),
        },
        ColumnSpec {
            header: "Streamer",
            extract: |row, _| opt(&row.streamer_name),
        },
    ]
}

/// Download name: `{station}_timeline_{start}_to_{end}.csv`, bounds in `tz`
pub fn csv_filename(short_name: &str, range: &DateRange, tz: &Tz) -> String {
    const STAMP: &str = "%Y-%m-%d_%H-%M-%S";
    format!(
        "{}_timeline_{}_to_{}.csv",
        short_name,
        range.start().with_timezone(tz).format(STAMP),
        range.end().with_timezone(tz).format(STAMP),
    )
}

fn sink_err(e: impl Into<std::io::Error>) -> ExportError {
    ExportError::SinkWrite(e.into())
}

/// Drain `iter` into `sink` as CSV; returns the number of data rows written
///
/// The header goes out first, then each batch is flushed as soon as it is
/// encoded. A write failure stops the iteration.
pub async fn write_csv<W>(
    iter: &mut BatchIterator,
    columns: &[ColumnSpec],
    tz: &Tz,
    sink: &mut W,
) -> Result<u64, ExportError>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    encode(&mut buf, std::iter::once(columns.iter().map(|c| c.header.to_string())))?;
    drain_to(&mut buf, sink).await?;

    let mut written = 0u64;
    while let Some(batch) = iter.next_batch().await? {
        encode(
            &mut buf,
            batch
                .iter()
                .map(|row| columns.iter().map(move |c| (c.extract)(row, tz))),
        )?;
        written += batch.len() as u64;
        drain_to(&mut buf, sink).await?;
    }

    sink.flush().await.map_err(sink_err)?;
    Ok(written)
}

/// Append CSV records to `buf`
fn encode<R, F>(buf: &mut Vec<u8>, records: R) -> Result<(), ExportError>
where
    R: IntoIterator<Item = F>,
    F: IntoIterator<Item = String>,
{
    let mut writer = csv::Writer::from_writer(buf);
    for record in records {
        writer.write_record(record).map_err(sink_err)?;
    }
    writer.flush().map_err(sink_err)
}

async fn drain_to<W>(buf: &mut Vec<u8>, sink: &mut W) -> Result<(), ExportError>
where
    W: AsyncWrite + Unpin,
{
    if !buf.is_empty() {
        sink.write_all(buf).await.map_err(sink_err)?;
        buf.clear();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};

    use super::*;
    use crate::domain::history::query::HistoryQuery;
    use crate::domain::history::source::testing::{MemorySource, row, rows};
    use chrono::DateTime;

    const BASE: i64 = 1_714_521_600; // 2024-05-01 00:00:00 UTC

    fn range() -> DateRange {
        DateRange::new(
            DateTime::from_timestamp(BASE, 0).unwrap(),
            DateTime::from_timestamp(BASE + 86_399, 0).unwrap(),
        )
        .unwrap()
    }

    fn iter_over(data: Vec<crate::data::types::HistoryRow>, batch: u32) -> BatchIterator {
        let query = HistoryQuery::builder(1, range()).build();
        BatchIterator::new(Arc::new(MemorySource::new(data)), query, batch)
    }

    #[test]
    fn test_columns_render_row() {
        let mut r = row(1, BASE + 15 * 3600 + 5 * 60); // 15:05 UTC
        r.title = None;
        r.text = Some("Live Set".to_string());
        r.streamer_name = Some("DJ Nova".to_string());
        let tz = chrono_tz::UTC;

        let values: Vec<String> = history_columns()
            .iter()
            .map(|c| (c.extract)(&r, &tz))
            .collect();
        assert_eq!(
            values,
            vec![
                "2024-05-01",
                "3:05pm",
                "10",
                "2",
                "Live Set",
                "Artist 1",
                "Default",
                "DJ Nova"
            ]
        );
    }

    #[test]
    fn test_time_column_uses_station_timezone() {
        let r = row(1, BASE); // midnight UTC
        let columns = history_columns();
        let tz = chrono_tz::America::Los_Angeles;
        assert_eq!((columns[0].extract)(&r, &tz), "2024-04-30");
        assert_eq!((columns[1].extract)(&r, &tz), "5:00pm");
    }

    #[test]
    fn test_csv_filename() {
        assert_eq!(
            csv_filename("radio_one", &range(), &chrono_tz::UTC),
            "radio_one_timeline_2024-05-01_00-00-00_to_2024-05-01_23-59-59.csv"
        );
    }

    #[tokio::test]
    async fn test_write_csv_header_and_rows() {
        let mut iter = iter_over(rows(3, BASE), 2);
        let mut out = Vec::new();

        let written = write_csv(&mut iter, &history_columns(), &chrono_tz::UTC, &mut out)
            .await
            .unwrap();
        assert_eq!(written, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "Date,Time,Listeners,Delta,Track,Artist,Playlist,Streamer"
        );
        assert!(lines[1].contains("Song 3"));
    }

    #[tokio::test]
    async fn test_write_csv_quotes_fields() {
        let mut r = row(1, BASE + 60);
        r.title = Some("Hello, \"World\"".to_string());
        let mut iter = iter_over(vec![r], 10);
        let mut out = Vec::new();

        write_csv(&mut iter, &history_columns(), &chrono_tz::UTC, &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"Hello, \"\"World\"\"\""));
    }

    #[tokio::test]
    async fn test_empty_export_writes_header_only() {
        let mut iter = iter_over(Vec::new(), 10);
        let mut out = Vec::new();

        let written = write_csv(&mut iter, &history_columns(), &chrono_tz::UTC, &mut out)
            .await
            .unwrap();
        assert_eq!(written, 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    /// Sink recording each write as a separate chunk
    #[derive(Default)]
    struct ChunkSink {
        chunks: Vec<Vec<u8>>,
    }

    impl AsyncWrite for ChunkSink {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            self.chunks.push(buf.to_vec());
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_header_and_each_batch_written_separately() {
        let mut iter = iter_over(rows(5, BASE), 2);
        let mut sink = ChunkSink::default();

        let written = write_csv(&mut iter, &history_columns(), &chrono_tz::UTC, &mut sink)
            .await
            .unwrap();
        assert_eq!(written, 5);

        // Header, then batches of 2, 2 and 1 rows; no chunk is repeated
        let line_counts: Vec<usize> = sink
            .chunks
            .iter()
            .map(|c| String::from_utf8_lossy(c).lines().count())
            .collect();
        assert_eq!(line_counts, vec![1, 2, 2, 1]);
        assert!(String::from_utf8_lossy(&sink.chunks[0]).starts_with("Date,Time"));
    }

    /// Sink that fails after accepting `budget` writes
    struct FailingSink {
        budget: usize,
    }

    impl AsyncWrite for FailingSink {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            if self.budget == 0 {
                return Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()));
            }
            self.budget -= 1;
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_sink_failure_stops_iteration() {
        let source = Arc::new(MemorySource::new(rows(50, BASE)));
        let query = HistoryQuery::builder(1, range()).build();
        let mut iter = BatchIterator::new(source.clone(), query, 10);
        let mut sink = FailingSink { budget: 2 };

        let err = write_csv(&mut iter, &history_columns(), &chrono_tz::UTC, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::SinkWrite(_)));
        // Header and first batch accepted, second batch rejected
        assert_eq!(source.fetch_calls(), 2);
    }
}
