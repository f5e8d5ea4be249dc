//! Station repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::StationRow;

/// Create a station
#[cfg(test)]
pub async fn create_station(
    pool: &SqlitePool,
    name: &str,
    short_name: &str,
    timezone: &str,
) -> Result<StationRow, SqliteError> {
    let result =
        sqlx::query("INSERT INTO stations (name, short_name, timezone) VALUES (?, ?, ?)")
            .bind(name)
            .bind(short_name)
            .bind(timezone)
            .execute(pool)
            .await?;

    Ok(StationRow {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        short_name: short_name.to_string(),
        timezone: timezone.to_string(),
    })
}

/// Get a station by ID
pub async fn get_station(pool: &SqlitePool, id: i64) -> Result<Option<StationRow>, SqliteError> {
    let row = sqlx::query_as::<_, (i64, String, String, String)>(
        "SELECT id, name, short_name, timezone FROM stations WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(into_station))
}

/// Get a station by its short name
pub async fn get_by_short_name(
    pool: &SqlitePool,
    short_name: &str,
) -> Result<Option<StationRow>, SqliteError> {
    let row = sqlx::query_as::<_, (i64, String, String, String)>(
        "SELECT id, name, short_name, timezone FROM stations WHERE short_name = ?",
    )
    .bind(short_name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(into_station))
}

/// Resolve a path identifier: numeric IDs first, then short names
pub async fn resolve_station(
    pool: &SqlitePool,
    id_or_short_name: &str,
) -> Result<Option<StationRow>, SqliteError> {
    if let Ok(id) = id_or_short_name.parse::<i64>()
        && let Some(station) = get_station(pool, id).await?
    {
        return Ok(Some(station));
    }
    get_by_short_name(pool, id_or_short_name).await
}

/// Create a playlist for a station, returning its ID
#[cfg(test)]
pub async fn create_playlist(
    pool: &SqlitePool,
    station_id: i64,
    name: &str,
) -> Result<i64, SqliteError> {
    let result = sqlx::query("INSERT INTO station_playlists (station_id, name) VALUES (?, ?)")
        .bind(station_id)
        .bind(name)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Record a listener request for a station, returning its ID
#[cfg(test)]
pub async fn create_request(
    pool: &SqlitePool,
    station_id: i64,
    timestamp: i64,
) -> Result<i64, SqliteError> {
    let result = sqlx::query("INSERT INTO station_requests (station_id, timestamp) VALUES (?, ?)")
        .bind(station_id)
        .bind(timestamp)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

fn into_station((id, name, short_name, timezone): (i64, String, String, String)) -> StationRow {
    StationRow {
        id,
        name,
        short_name,
        timezone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::SqliteService;

    #[tokio::test]
    async fn test_create_and_get_station() {
        let db = SqliteService::in_memory().await.unwrap();
        let created = create_station(db.pool(), "Radio One", "radio_one", "Europe/Berlin")
            .await
            .unwrap();

        let fetched = get_station(db.pool(), created.id).await.unwrap();
        assert_eq!(fetched, Some(created.clone()));

        let by_name = get_by_short_name(db.pool(), "radio_one").await.unwrap();
        assert_eq!(by_name, Some(created));
    }

    #[tokio::test]
    async fn test_get_missing_station() {
        let db = SqliteService::in_memory().await.unwrap();
        assert!(get_station(db.pool(), 42).await.unwrap().is_none());
        assert!(get_by_short_name(db.pool(), "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_station_by_id_or_short_name() {
        let db = SqliteService::in_memory().await.unwrap();
        let station = create_station(db.pool(), "Jazz", "jazz", "UTC").await.unwrap();

        let by_id = resolve_station(db.pool(), &station.id.to_string())
            .await
            .unwrap();
        assert_eq!(by_id.map(|s| s.id), Some(station.id));

        let by_name = resolve_station(db.pool(), "jazz").await.unwrap();
        assert_eq!(by_name.map(|s| s.id), Some(station.id));

        assert!(resolve_station(db.pool(), "999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_short_name_rejects_path_separators() {
        let db = SqliteService::in_memory().await.unwrap();
        assert!(create_station(db.pool(), "Bad", "a/b", "UTC").await.is_err());
        assert!(create_station(db.pool(), "Bad", "..", "UTC").await.is_err());
    }

    #[tokio::test]
    async fn test_short_name_is_unique() {
        let db = SqliteService::in_memory().await.unwrap();
        create_station(db.pool(), "One", "dup", "UTC").await.unwrap();
        assert!(create_station(db.pool(), "Two", "dup", "UTC").await.is_err());
    }
}
