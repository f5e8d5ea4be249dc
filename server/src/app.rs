//! Application lifecycle: logging, initialization, serving, teardown

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands, SystemCommands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG, ENV_LOG_FORMAT};
use crate::core::shutdown::ShutdownService;
use crate::core::storage::AppStorage;
use crate::data::SqliteService;
use crate::data::files::{RecordingStorage, open_recording_storage};

/// Log line layout selected through `ONAIR_LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Everything a running station API needs, owned in one place
pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub storage: AppStorage,
    pub database: Arc<SqliteService>,
    pub recordings: Arc<dyn RecordingStorage>,
}

impl CoreApp {
    /// Parse the command line and run whatever it asks for
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        init_logging();

        let (cli_config, command) = cli::parse();
        tracing::debug!(command = ?command, "Starting");

        if let Some(Commands::System { command }) = command {
            return run_system_command(command);
        }

        let app = Self::init(&cli_config).await?;
        app.serve().await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let storage = AppStorage::init(&config).await?;

        let database = SqliteService::init(&storage, &config.database)
            .await
            .context("Failed to open the station database")?;
        let database = Arc::new(database);

        let recordings = open_recording_storage(&config.recordings, &storage)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open recording storage: {}", e))?;
        tracing::debug!(backend = %config.recordings.storage, "Recording storage ready");

        Ok(Self {
            shutdown: ShutdownService::new(database.clone()),
            config,
            storage,
            database,
            recordings,
        })
    }

    async fn serve(self) -> Result<()> {
        // Signals must be caught before the listener binds
        self.shutdown.install_signal_handlers();
        self.start_background_tasks().await;

        banner::print_banner(&self.config, &self.storage.data_dir().display().to_string());

        let app = ApiServer::new(self).start().await?;
        app.shutdown.shutdown().await;
        Ok(())
    }

    /// Spawn periodic maintenance; handles are awaited on shutdown
    pub async fn start_background_tasks(&self) {
        let checkpoint = self
            .database
            .start_checkpoint_task(self.shutdown.subscribe());
        self.shutdown.register(checkpoint).await;
    }
}

fn run_system_command(command: SystemCommands) -> Result<()> {
    match command {
        SystemCommands::Prune { yes } => prune_data_dir(&AppStorage::resolve_data_dir(), yes),
    }
}

/// Remove the local data directory (database and filesystem recordings)
fn prune_data_dir(data_dir: &Path, assume_yes: bool) -> Result<()> {
    if !data_dir.exists() {
        println!("No data directory at {}; nothing to prune.", data_dir.display());
        return Ok(());
    }
    let target = data_dir
        .canonicalize()
        .unwrap_or_else(|_| data_dir.to_path_buf());

    println!("About to delete {}", target.display());
    println!("This removes the station database and locally stored recordings.");
    println!("Stop the server first; pruning a live data directory corrupts it.");

    if !assume_yes && !confirm("Delete it? [y/N] ")? {
        println!("Aborted.");
        return Ok(());
    }

    std::fs::remove_dir_all(&target)
        .with_context(|| format!("Failed to delete {}", target.display()))?;
    println!("Deleted {}", target.display());
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| format!("info,{}=info", APP_NAME_LOWER));
    let format = LogFormat::from_env_value(std::env::var(ENV_LOG_FORMAT).ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match format {
        LogFormat::Json => builder.json().with_current_span(false).init(),
        LogFormat::Compact => builder.compact().with_ansi(true).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_env_value(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(Some("pretty")), LogFormat::Compact);
        assert_eq!(LogFormat::from_env_value(None), LogFormat::Compact);
    }

    #[test]
    fn test_prune_missing_dir_is_noop() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("absent");
        prune_data_dir(&missing, true).unwrap();
        assert!(!missing.exists());
    }

    #[test]
    fn test_prune_removes_data_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let data_dir = temp.path().join("data");
        std::fs::create_dir_all(data_dir.join("recordings")).unwrap();
        std::fs::write(data_dir.join("onair.db"), b"x").unwrap();

        prune_data_dir(&data_dir, true).unwrap();
        assert!(!data_dir.exists());
    }
}
