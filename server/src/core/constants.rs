// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "OnAir";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "onair";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".onair";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "onair.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "ONAIR_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "ONAIR_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "ONAIR_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "ONAIR_LOG";

/// Environment variable selecting the log line format (`compact` or `json`)
pub const ENV_LOG_FORMAT: &str = "ONAIR_LOG_FORMAT";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// Default request body limit (the API only accepts small JSON bodies)
pub const DEFAULT_BODY_LIMIT: usize = 256 * 1024;

/// Timeout for background tasks during graceful shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Environment Variables - Storage
// =============================================================================

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "ONAIR_DATA_DIR";

/// Environment variable for the SQLite database path
pub const ENV_DATABASE_PATH: &str = "ONAIR_DATABASE_PATH";

/// Environment variable for the recordings storage backend
pub const ENV_RECORDINGS_STORAGE: &str = "ONAIR_RECORDINGS_STORAGE";

/// Environment variable for the recordings filesystem root
pub const ENV_RECORDINGS_PATH: &str = "ONAIR_RECORDINGS_PATH";

// =============================================================================
// SQLite
// =============================================================================

/// SQLite database file name
pub const SQLITE_DB_FILENAME: &str = "onair.db";

/// Max pooled SQLite connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// Busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// Page cache size (negative = KiB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

/// WAL auto-checkpoint threshold in pages
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// Interval between explicit WAL checkpoints
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Recordings
// =============================================================================

/// Default S3 key prefix for recordings
pub const RECORDINGS_DEFAULT_S3_PREFIX: &str = "recordings";

/// MIME type used when a recording's type cannot be determined
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

// =============================================================================
// History export
// =============================================================================

/// Environment variable for the export time limit
pub const ENV_HISTORY_EXPORT_MAX_DURATION: &str = "ONAIR_HISTORY_EXPORT_MAX_DURATION_SECS";

/// Rows fetched per batch when streaming an export
pub const HISTORY_EXPORT_BATCH_SIZE: u32 = 100;

/// Upper bound on a single export (JSON page or CSV stream)
pub const HISTORY_EXPORT_MAX_DURATION_SECS: u64 = 600;

/// Bytes buffered between the CSV writer and the HTTP body
pub const HISTORY_EXPORT_PIPE_BYTES: usize = 64 * 1024;

/// Default rows per page for paged endpoints
pub const DEFAULT_PER_PAGE: u32 = 25;

/// Maximum rows per page for paged endpoints
pub const MAX_PER_PAGE: u32 = 500;
