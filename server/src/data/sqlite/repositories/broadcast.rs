//! Broadcast repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::BroadcastRow;

type BroadcastTuple = (i64, i64, i64, i64, i64, Option<String>);

fn into_broadcast(
    (id, station_id, streamer_id, timestamp_start, timestamp_end, recording_path): BroadcastTuple,
) -> BroadcastRow {
    BroadcastRow {
        id,
        station_id,
        streamer_id,
        timestamp_start,
        timestamp_end,
        recording_path,
    }
}

/// Record a broadcast session
#[cfg(test)]
pub async fn create_broadcast(
    pool: &SqlitePool,
    station_id: i64,
    streamer_id: i64,
    timestamp_start: i64,
    timestamp_end: i64,
    recording_path: Option<&str>,
) -> Result<BroadcastRow, SqliteError> {
    let result = sqlx::query(
        r#"
        INSERT INTO station_streamer_broadcasts
            (station_id, streamer_id, timestamp_start, timestamp_end, recording_path)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(station_id)
    .bind(streamer_id)
    .bind(timestamp_start)
    .bind(timestamp_end)
    .bind(recording_path)
    .execute(pool)
    .await?;

    Ok(BroadcastRow {
        id: result.last_insert_rowid(),
        station_id,
        streamer_id,
        timestamp_start,
        timestamp_end,
        recording_path: recording_path.map(str::to_string),
    })
}

/// List a streamer's broadcasts, newest first (with pagination)
pub async fn list_for_streamer(
    pool: &SqlitePool,
    station_id: i64,
    streamer_id: i64,
    limit: u32,
    offset: u64,
) -> Result<(Vec<BroadcastRow>, u64), SqliteError> {
    let rows = sqlx::query_as::<_, BroadcastTuple>(
        r#"
        SELECT id, station_id, streamer_id, timestamp_start, timestamp_end, recording_path
        FROM station_streamer_broadcasts
        WHERE station_id = ? AND streamer_id = ?
        ORDER BY timestamp_start DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(station_id)
    .bind(streamer_id)
    .bind(i64::from(limit))
    .bind(i64::try_from(offset).unwrap_or(i64::MAX))
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM station_streamer_broadcasts WHERE station_id = ? AND streamer_id = ?",
    )
    .bind(station_id)
    .bind(streamer_id)
    .fetch_one(pool)
    .await?;

    Ok((
        rows.into_iter().map(into_broadcast).collect(),
        total.0.max(0) as u64,
    ))
}

/// Get a broadcast by ID, only if it belongs to the station
pub async fn get_broadcast(
    pool: &SqlitePool,
    station_id: i64,
    id: i64,
) -> Result<Option<BroadcastRow>, SqliteError> {
    let row = sqlx::query_as::<_, BroadcastTuple>(
        r#"
        SELECT id, station_id, streamer_id, timestamp_start, timestamp_end, recording_path
        FROM station_streamer_broadcasts
        WHERE id = ? AND station_id = ?
        "#,
    )
    .bind(id)
    .bind(station_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(into_broadcast))
}

/// Clear the recording path if it still equals `expected`
///
/// Returns false when another writer changed or cleared it first.
pub async fn clear_recording_path(
    pool: &SqlitePool,
    id: i64,
    expected: &str,
) -> Result<bool, SqliteError> {
    let result = sqlx::query(
        r#"
        UPDATE station_streamer_broadcasts
        SET recording_path = NULL
        WHERE id = ? AND recording_path = ?
        "#,
    )
    .bind(id)
    .bind(expected)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
