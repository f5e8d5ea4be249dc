//! Startup banner

use super::config::{AppConfig, StorageBackend, is_all_interfaces};
use super::constants::APP_NAME;

/// Host shown to the user; wildcard binds are reachable on localhost
fn display_host(host: &str) -> &str {
    if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    }
}

/// Print the startup banner with endpoints and storage locations
pub fn print_banner(config: &AppConfig, data_dir: &str) {
    let host = display_host(&config.server.host);
    let port = config.server.port;
    const W: usize = 12;

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/api/v1",
        "API:", host, port
    );

    let recordings = match (&config.recordings.storage, &config.recordings.s3) {
        (StorageBackend::S3, Some(s3)) => format!("s3://{}/{}", s3.bucket, s3.prefix),
        _ => config
            .recordings
            .filesystem_path
            .clone()
            .unwrap_or_else(|| format!("{}/recordings", data_dir)),
    };
    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "Recordings:", recordings
    );
    println!("  \x1b[90m➜  {:<W$} {}\x1b[0m", "Data:", data_dir);

    if config.server.host == "127.0.0.1" || config.server.host == "localhost" {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m",
            "Network:"
        );
    }
    println!();
}
