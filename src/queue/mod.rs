//! Durable queue: the record store seam, the SQLite backend, and the
//! single-consumer drain loop.

pub mod queue;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite_store;

pub use queue::{DrainSummary, Queue, QueueBuilder, QueueError};
pub use store::{StoreError, StoredTask, TaskStore};

#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteTaskStore;
