use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_PER_PAGE, DEFAULT_PORT,
    HISTORY_EXPORT_BATCH_SIZE, HISTORY_EXPORT_MAX_DURATION_SECS, MAX_PER_PAGE,
    RECORDINGS_DEFAULT_S3_PREFIX,
};

// =============================================================================
// Storage Backend Enum
// =============================================================================

/// Storage backend type for broadcast recordings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    S3,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Filesystem => write!(f, "filesystem"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}

// =============================================================================
// File Config Sections (JSON)
// =============================================================================

/// Server configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Database configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub path: Option<String>,
}

/// Filesystem recording storage configuration
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RecordingsFilesystemFileConfig {
    pub path: Option<String>,
}

/// S3 recording storage configuration
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RecordingsS3FileConfig {
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

/// Recording storage configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RecordingsFileConfig {
    pub storage: Option<StorageBackend>,
    pub filesystem: Option<RecordingsFilesystemFileConfig>,
    pub s3: Option<RecordingsS3FileConfig>,
}

/// History export configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct HistoryFileConfig {
    pub export_max_duration_secs: Option<u64>,
    pub export_batch_size: Option<u32>,
    pub default_per_page: Option<u32>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    pub recordings: Option<RecordingsFileConfig>,
    pub history: Option<HistoryFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        // Server
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        // Database
        if let Some(database) = other.database {
            let current = self.database.get_or_insert_with(DatabaseFileConfig::default);
            if database.path.is_some() {
                tracing::trace!(path = ?database.path, "Merging database.path");
                current.path = database.path;
            }
        }

        // Recordings (with nested filesystem and s3)
        if let Some(recordings) = other.recordings {
            let current = self
                .recordings
                .get_or_insert_with(RecordingsFileConfig::default);
            if recordings.storage.is_some() {
                tracing::trace!(storage = ?recordings.storage, "Merging recordings.storage");
                current.storage = recordings.storage;
            }
            if let Some(filesystem) = recordings.filesystem {
                let current_fs = current
                    .filesystem
                    .get_or_insert_with(RecordingsFilesystemFileConfig::default);
                if filesystem.path.is_some() {
                    current_fs.path = filesystem.path;
                }
            }
            if let Some(s3) = recordings.s3 {
                let current_s3 = current
                    .s3
                    .get_or_insert_with(RecordingsS3FileConfig::default);
                if s3.bucket.is_some() {
                    current_s3.bucket = s3.bucket;
                }
                if s3.prefix.is_some() {
                    current_s3.prefix = s3.prefix;
                }
                if s3.region.is_some() {
                    current_s3.region = s3.region;
                }
                if s3.endpoint.is_some() {
                    current_s3.endpoint = s3.endpoint;
                }
            }
        }

        // History
        if let Some(history) = other.history {
            let current = self.history.get_or_insert_with(HistoryFileConfig::default);
            if history.export_max_duration_secs.is_some() {
                tracing::trace!(
                    secs = ?history.export_max_duration_secs,
                    "Merging history.export_max_duration_secs"
                );
                current.export_max_duration_secs = history.export_max_duration_secs;
            }
            if history.export_batch_size.is_some() {
                current.export_batch_size = history.export_batch_size;
            }
            if history.default_per_page.is_some() {
                current.default_per_page = history.default_per_page;
            }
        }
    }
}

// =============================================================================
// Runtime Config
// =============================================================================

/// Server configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration (final/runtime)
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Explicit SQLite file; `None` places it under the data directory
    pub path: Option<String>,
}

/// S3 configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub prefix: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

/// Recording storage configuration (final/runtime)
#[derive(Debug, Clone, Default)]
pub struct RecordingsConfig {
    pub storage: StorageBackend,
    pub filesystem_path: Option<String>,
    pub s3: Option<S3Config>,
}

/// History export configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub export_max_duration_secs: u64,
    pub export_batch_size: u32,
    pub default_per_page: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            export_max_duration_secs: HISTORY_EXPORT_MAX_DURATION_SECS,
            export_batch_size: HISTORY_EXPORT_BATCH_SIZE,
            default_per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Application configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub recordings: RecordingsConfig,
    pub history: HistoryConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.onair/onair.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.onair/onair.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::from_layers(cli, file_config);

        // Validate configuration
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            database_path = ?config.database.path,
            recordings_storage = %config.recordings.storage,
            export_max_duration_secs = config.history.export_max_duration_secs,
            export_batch_size = config.history.export_batch_size,
            default_per_page = config.history.default_per_page,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn from_layers(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();
        let file_recordings = file_config.recordings.unwrap_or_default();
        let file_history = file_config.history.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let database_path = cli
            .database_path
            .clone()
            .or(file_database.path)
            .filter(|p| !p.trim().is_empty());

        let storage = cli
            .recordings_storage
            .or(file_recordings.storage)
            .unwrap_or_default();
        let filesystem_path = cli.recordings_path.clone().or(file_recordings
            .filesystem
            .unwrap_or_default()
            .path);

        // S3 config (only populated if using s3 backend with a bucket)
        let s3 = if storage == StorageBackend::S3 {
            let file_s3 = file_recordings.s3.unwrap_or_default();
            file_s3
                .bucket
                .filter(|b| !b.trim().is_empty())
                .map(|bucket| S3Config {
                    bucket,
                    prefix: file_s3
                        .prefix
                        .unwrap_or_else(|| RECORDINGS_DEFAULT_S3_PREFIX.to_string()),
                    region: file_s3.region,
                    endpoint: file_s3.endpoint,
                })
        } else {
            None
        };

        let export_max_duration_secs = cli
            .history_export_max_duration
            .or(file_history.export_max_duration_secs)
            .unwrap_or(HISTORY_EXPORT_MAX_DURATION_SECS);
        let export_batch_size = file_history
            .export_batch_size
            .unwrap_or(HISTORY_EXPORT_BATCH_SIZE);
        let default_per_page = file_history
            .default_per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .min(MAX_PER_PAGE);

        Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                path: database_path,
            },
            recordings: RecordingsConfig {
                storage,
                filesystem_path,
                s3,
            },
            history: HistoryConfig {
                export_max_duration_secs,
                export_batch_size,
                default_per_page,
            },
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        // Host must not be empty
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port must be non-zero (port 0 would cause bind failure)
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        // S3 bucket required when using S3 storage
        if self.recordings.storage == StorageBackend::S3 && self.recordings.s3.is_none() {
            anyhow::bail!(
                "Configuration error: recordings.s3.bucket is required (and non-empty) when recordings.storage is 's3'"
            );
        }

        if self.history.export_batch_size == 0 {
            anyhow::bail!("Configuration error: history.export_batch_size must be greater than 0");
        }
        if self.history.export_max_duration_secs == 0 {
            anyhow::bail!(
                "Configuration error: history.export_max_duration_secs must be greater than 0"
            );
        }
        if self.history.default_per_page == 0 {
            anyhow::bail!("Configuration error: history.default_per_page must be greater than 0");
        }

        // The API carries no authorization layer of its own
        if is_all_interfaces(&self.server.host) {
            tracing::warn!(
                host = %self.server.host,
                "Server binds to all interfaces; place it behind an authenticating proxy"
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.onair/onair.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub(crate) fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}
