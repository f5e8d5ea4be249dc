use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::StorageBackend;
use super::constants::{
    ENV_CONFIG, ENV_DATABASE_PATH, ENV_HISTORY_EXPORT_MAX_DURATION, ENV_HOST, ENV_PORT,
    ENV_RECORDINGS_PATH, ENV_RECORDINGS_STORAGE,
};

#[derive(Parser)]
#[command(name = "onair")]
#[command(version, about = "Radio station history and broadcast API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQLite database file (defaults to the data directory)
    #[arg(long, global = true, env = ENV_DATABASE_PATH)]
    pub database_path: Option<String>,

    /// Recording storage backend (filesystem or s3)
    #[arg(long, global = true, env = ENV_RECORDINGS_STORAGE, value_parser = parse_storage_backend)]
    pub recordings_storage: Option<StorageBackend>,

    /// Root directory for filesystem recording storage
    #[arg(long, global = true, env = ENV_RECORDINGS_PATH)]
    pub recordings_path: Option<String>,

    /// Upper bound in seconds for a single history export
    #[arg(long, global = true, env = ENV_HISTORY_EXPORT_MAX_DURATION)]
    pub history_export_max_duration: Option<u64>,
}

/// Parse storage backend from CLI/env string
fn parse_storage_backend(s: &str) -> Result<StorageBackend, String> {
    match s.to_lowercase().as_str() {
        "filesystem" => Ok(StorageBackend::Filesystem),
        "s3" => Ok(StorageBackend::S3),
        _ => Err(format!(
            "Invalid storage backend '{}'. Valid options: filesystem, s3",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// System maintenance commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SystemCommands {
    /// Delete local data directory (database, local recordings). Requires confirmation.
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub database_path: Option<String>,
    pub recordings_storage: Option<StorageBackend>,
    pub recordings_path: Option<String>,
    pub history_export_max_duration: Option<u64>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        database_path: cli.database_path,
        recordings_storage: cli.recordings_storage,
        recordings_path: cli.recordings_path,
        history_export_max_duration: cli.history_export_max_duration,
    };
    (config, cli.command)
}
