//! Unified error type for the data layer

use thiserror::Error;

use crate::data::sqlite::SqliteError;

/// Error type for data layer operations
///
/// Wraps backend errors so domain code never depends on sqlx directly.
#[derive(Error, Debug)]
pub enum DataError {
    /// SQLite database error
    #[error("SQLite error: {0}")]
    Sqlite(sqlx::Error),

    /// Migration failed
    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    /// No pooled connection became available in time
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DataError {
    /// Check if this is a connection-related error that might be transient
    pub fn is_transient(&self) -> bool {
        match self {
            Self::PoolExhausted => true,
            Self::Sqlite(e) => matches!(e, sqlx::Error::PoolClosed | sqlx::Error::Io(_)),
            Self::MigrationFailed { .. } => false,
        }
    }
}

impl From<sqlx::Error> for DataError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => Self::PoolExhausted,
            other => Self::Sqlite(other),
        }
    }
}

impl From<SqliteError> for DataError {
    fn from(e: SqliteError) -> Self {
        match e {
            SqliteError::Database(e) => e.into(),
            SqliteError::MigrationFailed {
                version,
                name,
                error,
            } => Self::MigrationFailed {
                version,
                name,
                error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_failed_error_display() {
        let err: DataError = SqliteError::MigrationFailed {
            version: 2,
            name: "add_broadcast_streamer_index".to_string(),
            error: "syntax error".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Migration 2 (add_broadcast_streamer_index) failed: syntax error"
        );
    }

    #[test]
    fn test_pool_timeout_maps_to_exhausted() {
        let err: DataError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DataError::PoolExhausted));
        assert!(err.is_transient());
    }

    #[test]
    fn test_is_transient() {
        assert!(DataError::from(sqlx::Error::PoolClosed).is_transient());
        assert!(!DataError::from(sqlx::Error::RowNotFound).is_transient());
        assert!(
            !DataError::MigrationFailed {
                version: 1,
                name: "x".to_string(),
                error: "y".to_string(),
            }
            .is_transient()
        );
    }
}
