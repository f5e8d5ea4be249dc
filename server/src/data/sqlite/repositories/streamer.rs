//! Streamer repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::StreamerRow;

/// Create a streamer account for a station
#[cfg(test)]
pub async fn create_streamer(
    pool: &SqlitePool,
    station_id: i64,
    streamer_username: &str,
    display_name: Option<&str>,
) -> Result<StreamerRow, SqliteError> {
    let result = sqlx::query(
        "INSERT INTO station_streamers (station_id, streamer_username, display_name) VALUES (?, ?, ?)",
    )
    .bind(station_id)
    .bind(streamer_username)
    .bind(display_name)
    .execute(pool)
    .await?;

    Ok(StreamerRow {
        id: result.last_insert_rowid(),
        station_id,
        streamer_username: streamer_username.to_string(),
        display_name: display_name.map(str::to_string),
    })
}

/// Get a streamer by ID, only if it belongs to the station
pub async fn get_streamer(
    pool: &SqlitePool,
    station_id: i64,
    id: i64,
) -> Result<Option<StreamerRow>, SqliteError> {
    let row = sqlx::query_as::<_, (i64, i64, String, Option<String>)>(
        r#"
        SELECT id, station_id, streamer_username, display_name
        FROM station_streamers
        WHERE id = ? AND station_id = ?
        "#,
    )
    .bind(id)
    .bind(station_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(id, station_id, streamer_username, display_name)| StreamerRow {
            id,
            station_id,
            streamer_username,
            display_name,
        },
    ))
}
