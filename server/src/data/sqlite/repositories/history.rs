//! Song history repository for SQLite operations
//!
//! Every read applies the full [`HistoryFilter`]. Ordering is always on
//! `(timestamp_start, id)` so offset pages and keyset batches are stable
//! even when several tracks share a start second.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::data::sqlite::SqliteError;
#[cfg(test)]
use crate::data::types::NewSongHistory;
use crate::data::types::{HistoryFilter, HistoryRow};
use crate::utils::sql::contains_pattern;

type HistoryTuple = (
    i64,
    i64,
    i64,
    i64,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    i64,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i64>,
    Option<i64>,
);

const SELECT_HISTORY: &str = r#"
    SELECT sh.id, sh.station_id, sh.timestamp_start, sh.timestamp_end, sh.duration,
           sh.listeners_start, sh.listeners_end, sh.delta_total,
           sh.text, sh.title, sh.artist,
           sp.name,
           COALESCE(NULLIF(ss.display_name, ''), ss.streamer_username),
           sh.request_id, sr.timestamp
    FROM song_history sh
    LEFT JOIN station_playlists sp ON sp.id = sh.playlist_id
    LEFT JOIN station_streamers ss ON ss.id = sh.streamer_id
    LEFT JOIN station_requests sr ON sr.id = sh.request_id
"#;

fn into_history(
    (
        id,
        station_id,
        timestamp_start,
        timestamp_end,
        duration,
        listeners_start,
        listeners_end,
        delta_total,
        text,
        title,
        artist,
        playlist_name,
        streamer_name,
        request_id,
        requested_at,
    ): HistoryTuple,
) -> HistoryRow {
    HistoryRow {
        id,
        station_id,
        timestamp_start,
        timestamp_end,
        duration,
        listeners_start,
        listeners_end,
        delta_total,
        text,
        title,
        artist,
        playlist_name,
        streamer_name,
        request_id,
        requested_at,
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &HistoryFilter) {
    qb.push(" WHERE sh.station_id = ")
        .push_bind(filter.station_id)
        .push(" AND sh.listeners_start IS NOT NULL")
        .push(" AND sh.timestamp_start BETWEEN ")
        .push_bind(filter.start)
        .push(" AND ")
        .push_bind(filter.end);

    if let Some(search) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = contains_pattern(search);
        qb.push(" AND (sh.title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR sh.artist LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

fn push_order(qb: &mut QueryBuilder<'_, Sqlite>, descending: bool) {
    let dir = if descending { "DESC" } else { "ASC" };
    qb.push(format!(" ORDER BY sh.timestamp_start {dir}, sh.id {dir}"));
}

/// Count rows matching the filter
pub async fn count_history(pool: &SqlitePool, filter: &HistoryFilter) -> Result<u64, SqliteError> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM song_history sh");
    push_filter(&mut qb, filter);

    let total: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(total.max(0) as u64)
}

/// Fetch one offset page of matching rows
pub async fn list_history(
    pool: &SqlitePool,
    filter: &HistoryFilter,
    offset: u64,
    limit: u32,
) -> Result<Vec<HistoryRow>, SqliteError> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_HISTORY);
    push_filter(&mut qb, filter);
    push_order(&mut qb, filter.descending);
    qb.push(" LIMIT ")
        .push_bind(i64::from(limit))
        .push(" OFFSET ")
        .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

    let rows = qb.build_query_as::<HistoryTuple>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(into_history).collect())
}

/// Fetch up to `limit` rows strictly after the `(timestamp_start, id)` cursor
pub async fn list_history_after(
    pool: &SqlitePool,
    filter: &HistoryFilter,
    after: Option<(i64, i64)>,
    limit: u32,
) -> Result<Vec<HistoryRow>, SqliteError> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_HISTORY);
    push_filter(&mut qb, filter);

    if let Some((timestamp_start, id)) = after {
        let cmp = if filter.descending { "<" } else { ">" };
        qb.push(format!(" AND (sh.timestamp_start {cmp} "))
            .push_bind(timestamp_start)
            .push(" OR (sh.timestamp_start = ")
            .push_bind(timestamp_start)
            .push(format!(" AND sh.id {cmp} "))
            .push_bind(id)
            .push("))");
    }

    push_order(&mut qb, filter.descending);
    qb.push(" LIMIT ").push_bind(i64::from(limit));

    let rows = qb.build_query_as::<HistoryTuple>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(into_history).collect())
}

/// Insert a played track, returning its ID
#[cfg(test)]
pub async fn insert_song_history(
    pool: &SqlitePool,
    entry: &NewSongHistory,
) -> Result<i64, SqliteError> {
    let result = sqlx::query(
        r#"
        INSERT INTO song_history (
            station_id, timestamp_start, timestamp_end, duration,
            listeners_start, listeners_end, delta_total,
            text, title, artist, playlist_id, streamer_id, request_id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.station_id)
    .bind(entry.timestamp_start)
    .bind(entry.timestamp_end)
    .bind(entry.duration)
    .bind(entry.listeners_start)
    .bind(entry.listeners_end)
    .bind(entry.delta_total)
    .bind(&entry.text)
    .bind(&entry.title)
    .bind(&entry.artist)
    .bind(entry.playlist_id)
    .bind(entry.streamer_id)
    .bind(entry.request_id)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}
