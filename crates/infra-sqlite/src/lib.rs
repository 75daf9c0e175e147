// Walkin Infrastructure - SQLite Adapter
// Implements: QueueStore

mod connection;
mod migration;
mod queue_store;

pub use connection::create_pool;
pub use migration::{run_migrations, SCHEMA_VERSION};
pub use queue_store::SqliteQueueStore;
pub use sqlx::SqlitePool;

// sqlx::Error is mapped to AppError inside this crate (orphan rules forbid a
// From impl for AppError here)
