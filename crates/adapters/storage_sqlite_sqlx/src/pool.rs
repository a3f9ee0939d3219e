//! Opening the database and applying the embedded schema.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::error::StorageError;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const MAX_CONNECTIONS: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Migrated `SQLite` connection pool.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `url`, e.g.
    /// `sqlite:litehub.db`, and bring its schema up to date.
    ///
    /// File databases run in WAL mode so HTTP reads don't block the
    /// writes coming from the bridge listeners.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the URL is invalid, the file can't be
    /// opened or a migration fails.
    pub async fn open(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        Self::connect(options).await
    }

    /// Private in-memory database, gone once the pool is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a migration fails.
    pub async fn in_memory() -> Result<Self, StorageError> {
        Self::connect(SqliteConnectOptions::from_str("sqlite::memory:")?).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options.foreign_keys(true))
            .await?;
        MIGRATOR.run(&pool).await?;
        Ok(Self { pool })
    }

    /// Borrow the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
