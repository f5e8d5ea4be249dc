//! SQLite schema definitions
//!
//! `SCHEMA` is the full current schema applied to fresh databases. Existing
//! databases are brought forward by the versioned migrations.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Stations
-- =============================================================================
CREATE TABLE IF NOT EXISTS stations (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL CHECK(length(name) >= 1),
    short_name TEXT NOT NULL UNIQUE CHECK(
        length(short_name) >= 1 AND short_name NOT GLOB '*[/\]*' AND short_name NOT IN ('.', '..')
    ),
    timezone TEXT NOT NULL DEFAULT 'UTC'
);

-- =============================================================================
-- 2. Station collaborators referenced by history rows
-- =============================================================================
CREATE TABLE IF NOT EXISTS station_playlists (
    id INTEGER PRIMARY KEY,
    station_id INTEGER NOT NULL REFERENCES stations(id) ON DELETE CASCADE,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS station_streamers (
    id INTEGER PRIMARY KEY,
    station_id INTEGER NOT NULL REFERENCES stations(id) ON DELETE CASCADE,
    streamer_username TEXT NOT NULL,
    display_name TEXT,
    UNIQUE(station_id, streamer_username)
);

CREATE TABLE IF NOT EXISTS station_requests (
    id INTEGER PRIMARY KEY,
    station_id INTEGER NOT NULL REFERENCES stations(id) ON DELETE CASCADE,
    timestamp INTEGER NOT NULL,
    played_at INTEGER
);

-- =============================================================================
-- 3. Song history (one row per played track)
-- =============================================================================
CREATE TABLE IF NOT EXISTS song_history (
    id INTEGER PRIMARY KEY,
    station_id INTEGER NOT NULL REFERENCES stations(id) ON DELETE CASCADE,
    song_id TEXT,
    text TEXT,
    title TEXT,
    artist TEXT,
    timestamp_start INTEGER NOT NULL,
    timestamp_end INTEGER NOT NULL DEFAULT 0,
    duration INTEGER,
    listeners_start INTEGER,
    listeners_end INTEGER,
    delta_total INTEGER NOT NULL DEFAULT 0,
    playlist_id INTEGER REFERENCES station_playlists(id) ON DELETE SET NULL,
    streamer_id INTEGER REFERENCES station_streamers(id) ON DELETE SET NULL,
    request_id INTEGER REFERENCES station_requests(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_song_history_station_time
    ON song_history(station_id, timestamp_start, id);

-- =============================================================================
-- 4. Streamer broadcasts (recordings live in blob storage)
-- =============================================================================
CREATE TABLE IF NOT EXISTS station_streamer_broadcasts (
    id INTEGER PRIMARY KEY,
    station_id INTEGER NOT NULL REFERENCES stations(id) ON DELETE CASCADE,
    streamer_id INTEGER NOT NULL REFERENCES station_streamers(id) ON DELETE CASCADE,
    timestamp_start INTEGER NOT NULL,
    timestamp_end INTEGER NOT NULL DEFAULT 0,
    recording_path TEXT
);

CREATE INDEX IF NOT EXISTS idx_broadcasts_station_id
    ON station_streamer_broadcasts(station_id);

CREATE INDEX IF NOT EXISTS idx_broadcasts_streamer_time
    ON station_streamer_broadcasts(streamer_id, timestamp_start, id);
"#;

/// v2: keyset-friendly index for per-streamer broadcast listings
pub const MIGRATION_V2: &str = r#"
CREATE INDEX IF NOT EXISTS idx_broadcasts_streamer_time
    ON station_streamer_broadcasts(streamer_id, timestamp_start, id);
"#;
