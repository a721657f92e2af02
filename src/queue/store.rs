//! Task record storage trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::task::{TaskId, TaskSpec};

/// A pending task as read back from storage.
#[derive(Debug, Clone)]
pub struct StoredTask {
    pub id: TaskId,
    pub spec: TaskSpec,
    pub created_at: DateTime<Utc>,
}

/// Error type for store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying storage unavailable or corrupt. Fatal; no recovery.
    #[error("storage error: {0}")]
    Storage(String),

    /// A payload could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A persisted payload no longer decodes to a known task variant
    /// (schema drift). Surfaced loudly rather than skipped: skipping
    /// would leak an unprocessable pending record forever.
    #[error("corrupt payload in record {id}: {message}")]
    Deserialization { id: TaskId, message: String },
}

/// Trait for durable task record backends.
///
/// A record moves through exactly one transition, `Pending -> Done`, via
/// [`TaskStore::mark_done`]. Implementations must make each operation
/// individually atomic and every enqueue immediately visible to subsequent
/// reads; nothing here may cache.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Append a pending record for `spec` and return its assigned id.
    ///
    /// Ids are monotonically increasing in insertion order.
    async fn enqueue(&self, spec: &TaskSpec) -> Result<TaskId, StoreError>;

    /// The pending record with the lowest id, decoded, or `None`.
    ///
    /// Does not mutate the record: a consumer that crashes before
    /// completing will see the same record again.
    async fn next_pending(&self) -> Result<Option<StoredTask>, StoreError>;

    /// Mark the record `Done`, keyed by id. Idempotent; the only
    /// sanctioned way a record leaves the pending state.
    async fn mark_done(&self, id: TaskId) -> Result<(), StoreError>;

    /// Fresh count of pending records.
    async fn pending_count(&self) -> Result<u64, StoreError>;
}
