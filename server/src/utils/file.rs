//! File and path utility functions

use std::path::{Path, PathBuf};

/// Expand a path string to an absolute path.
///
/// - `~` and `~/path` expand to the home directory
/// - relative paths and bare names resolve against the current directory
/// - absolute paths pass through unchanged
///
/// ```text
/// expand_path("~/.onair")   // -> /home/user/.onair
/// expand_path("recordings") // -> /current/dir/recordings
/// expand_path("/srv/media") // -> /srv/media
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

/// Last path segment of a stored recording path, for download filenames
///
/// Falls back to `fallback` when the path has no usable file name.
pub fn file_basename<'a>(path: &'a str, fallback: &'a str) -> &'a str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback)
}

/// Make a filename safe to embed in a quoted `Content-Disposition` value
pub fn header_safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
