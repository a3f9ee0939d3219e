//! # litehub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `litehub-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `litehub-app` (for port traits) and `litehub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod device_repo;
mod entity_repo;
mod error;
mod pool;

pub use device_repo::SqliteDeviceRepository;
pub use entity_repo::SqliteEntityRepository;
pub use error::StorageError;
pub use pool::Database;
