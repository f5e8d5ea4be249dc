//! SQLite error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_failed_error_display() {
        let err = SqliteError::MigrationFailed {
            version: 2,
            name: "add_broadcast_streamer_index".to_string(),
            error: "syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Migration 2 (add_broadcast_streamer_index) failed: syntax error"
        );
    }

    #[test]
    fn test_sqlx_error_from() {
        let err: SqliteError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, SqliteError::Database(_)));
        assert!(err.to_string().starts_with("Database error"));
    }
}
