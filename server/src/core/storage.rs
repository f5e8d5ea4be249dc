//! Local data directory layout
//!
//! The data directory holds the SQLite database and, when recordings use the
//! filesystem backend without an explicit root, the recordings tree.
//!
//! | Platform | Default location |
//! |----------|------------------|
//! | Linux | `$XDG_DATA_HOME/onair/` |
//! | macOS | `~/Library/Application Support/OnAir/` |
//! | Windows | `%APPDATA%\OnAir\` |
//!
//! `ONAIR_DATA_DIR` overrides the platform default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use super::config::{AppConfig, StorageBackend};
use super::constants::{APP_DOT_FOLDER, APP_NAME, ENV_DATA_DIR};
use crate::utils::file::expand_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSubdir {
    Sqlite,
    Recordings,
}

impl DataSubdir {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DataSubdir::Sqlite => "sqlite",
            DataSubdir::Recordings => "recordings",
        }
    }

    /// Subdirectories to create for a given recordings setup
    pub fn required(local_recordings: bool) -> Vec<DataSubdir> {
        let mut dirs = vec![DataSubdir::Sqlite];
        if local_recordings {
            dirs.push(DataSubdir::Recordings);
        }
        dirs
    }
}

#[derive(Debug, Clone)]
pub struct AppStorage {
    data_dir: PathBuf,
}

impl AppStorage {
    /// Create the data directory tree and pin its canonical path
    pub async fn init(config: &AppConfig) -> Result<Self> {
        let local_recordings = config.recordings.storage == StorageBackend::Filesystem
            && config.recordings.filesystem_path.is_none();

        let data_dir = Self::resolve_data_dir();
        Self::create_layout(&data_dir, local_recordings).await?;
        let data_dir = data_dir.canonicalize().unwrap_or(data_dir);

        tracing::debug!(
            data_dir = %data_dir.display(),
            local_recordings,
            "Data directory ready"
        );
        Ok(Self { data_dir })
    }

    /// `ONAIR_DATA_DIR`, else the platform data dir, else `./.onair`
    pub fn resolve_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            return expand_path(&dir);
        }
        match ProjectDirs::from("", "", APP_NAME) {
            Some(dirs) => dirs.data_dir().to_path_buf(),
            None => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(APP_DOT_FOLDER),
        }
    }

    async fn create_layout(data_dir: &Path, local_recordings: bool) -> Result<()> {
        for subdir in DataSubdir::required(local_recordings) {
            let path = data_dir.join(subdir.as_str());
            tokio::fs::create_dir_all(&path)
                .await
                .with_context(|| format!("Cannot create {}", path.display()))?;
        }
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of a subdirectory, canonicalized when it exists
    pub fn subdir(&self, subdir: DataSubdir) -> PathBuf {
        let path = self.data_dir.join(subdir.as_str());
        path.canonicalize().unwrap_or(path)
    }

    #[cfg(test)]
    pub fn init_for_test(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_subdirs() {
        assert_eq!(DataSubdir::required(false), vec![DataSubdir::Sqlite]);
        assert_eq!(
            DataSubdir::required(true),
            vec![DataSubdir::Sqlite, DataSubdir::Recordings]
        );
    }

    #[tokio::test]
    async fn test_create_layout_only_makes_recordings_when_local() {
        let local = tempfile::tempdir().unwrap();
        AppStorage::create_layout(local.path(), true).await.unwrap();
        assert!(local.path().join("sqlite").is_dir());
        assert!(local.path().join("recordings").is_dir());

        let remote = tempfile::tempdir().unwrap();
        AppStorage::create_layout(remote.path(), false).await.unwrap();
        assert!(remote.path().join("sqlite").is_dir());
        assert!(!remote.path().join("recordings").exists());
    }

    #[tokio::test]
    async fn test_create_layout_makes_missing_parents() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("a").join("b");
        AppStorage::create_layout(&nested, false).await.unwrap();
        assert!(nested.join("sqlite").is_dir());
    }

    #[test]
    fn test_subdir_joins_data_dir() {
        let temp = tempfile::tempdir().unwrap();
        let storage = AppStorage::init_for_test(temp.path().to_path_buf());
        assert!(storage.subdir(DataSubdir::Sqlite).ends_with("sqlite"));
        assert_eq!(storage.data_dir(), temp.path());
    }
}
