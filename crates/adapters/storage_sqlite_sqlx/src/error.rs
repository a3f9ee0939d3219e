//! Storage-specific error type wrapping sqlx errors.

use litehub_domain::error::LiteHubError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored column holds a value the domain cannot represent.
    #[error("malformed {column} column: {value:?}")]
    Malformed {
        column: &'static str,
        value: String,
    },
}

impl From<StorageError> for LiteHubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
