//! The queue invoker: enqueue, dequeue, complete, and the drain loop.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use super::store::{StoreError, TaskStore};
use crate::fetch::{FetchError, FetchPolicy, Fetcher, FileFetcher};
use crate::task::{Task, TaskError, TaskId, TaskSpec};

/// Error type for queue operations.
#[derive(Error, Debug)]
pub enum QueueError {
    /// `dequeue_next` was called with no pending record. Always fatal to
    /// the caller; guard with [`Queue::is_empty`].
    #[error("no pending tasks")]
    Empty,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A task that was never enqueued was asked to complete.
    #[error("task has not been enqueued; no record id to complete")]
    Unpersisted,
}

impl From<TaskError> for QueueError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Fetch(e) => Self::Fetch(e),
            TaskError::Store(e) => Self::Store(e),
            TaskError::Unpersisted => Self::Unpersisted,
        }
    }
}

/// What a completed drain did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    /// Tasks executed to completion, including ones discovered mid-drain.
    pub executed: u64,
}

/// A durable work queue over a [`TaskStore`], drained by a single consumer.
///
/// Owns the only store handle for the process and hands it to tasks at
/// dispatch time; tasks never reach storage any other way. Construct one
/// at process start with [`QueueBuilder`].
pub struct Queue<S: TaskStore> {
    store: Arc<S>,
    fetcher: Arc<dyn Fetcher>,
    fetch_policy: FetchPolicy,
}

impl<S: TaskStore + 'static> Queue<S> {
    /// True iff no record is pending. Evaluated fresh on every call:
    /// in-flight execution enqueues new records between loop iterations.
    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.store.pending_count().await? == 0)
    }

    /// Persist `spec` as a new pending task and return its assigned id.
    ///
    /// Never blocks on other records; the new record is visible to
    /// subsequent `is_empty`/`dequeue_next` calls immediately.
    pub async fn enqueue(&self, spec: TaskSpec) -> Result<TaskId, QueueError> {
        let id = self.store.enqueue(&spec).await?;
        debug!(%id, variant = spec.variant(), "task enqueued");
        Ok(id)
    }

    /// Enqueue `spec` only when the queue has no pending work.
    ///
    /// The bootstrap idiom: a restarted process seeds exactly one root
    /// task, while a queue holding interrupted work resumes it untouched.
    pub async fn seed_if_empty(&self, spec: TaskSpec) -> Result<Option<TaskId>, QueueError> {
        if self.is_empty().await? {
            Ok(Some(self.enqueue(spec).await?))
        } else {
            Ok(None)
        }
    }

    /// Dequeue the pending task with the lowest id (insertion order).
    ///
    /// The record is not mutated; the returned [`Task`] carries the
    /// record's id. Fails with [`QueueError::Empty`] when nothing is
    /// pending.
    pub async fn dequeue_next(&self) -> Result<Task, QueueError> {
        match self.store.next_pending().await? {
            Some(stored) => Ok(Task::from_record(stored.id, stored.spec)),
            None => Err(QueueError::Empty),
        }
    }

    /// Idempotently transition `task` to done, keyed by its record id.
    pub async fn complete_task(&self, task: &mut Task) -> Result<(), QueueError> {
        task.complete(self.store.as_ref()).await.map_err(Into::into)
    }

    /// Run the frontier to exhaustion: while any record is pending,
    /// dequeue the next task and execute it to completion.
    ///
    /// Emptiness is re-checked every iteration, so tasks discovered
    /// mid-drain are drained too. One task runs at a time. Under
    /// [`FetchPolicy::Abort`] a task failure aborts the drain and leaves
    /// the current record pending, to be re-executed verbatim by the next
    /// drain; records are therefore delivered at least once.
    pub async fn drain(&self) -> Result<DrainSummary, QueueError> {
        let mut executed = 0u64;

        while !self.is_empty().await? {
            let mut task = self.dequeue_next().await?;
            info!(
                id = ?task.id(),
                variant = task.spec().variant(),
                url = %task.target(),
                "executing task"
            );

            if let Err(err) = task
                .execute(self.fetcher.as_ref(), self.store.as_ref(), self.fetch_policy)
                .await
            {
                error!(id = ?task.id(), error = %err, "task failed; record stays pending");
                return Err(err.into());
            }
            executed += 1;
        }

        info!(executed, "frontier drained");
        Ok(DrainSummary { executed })
    }
}

/// Builder for constructing a [`Queue`].
pub struct QueueBuilder<S: TaskStore> {
    store: S,
    fetcher: Option<Arc<dyn Fetcher>>,
    fetch_policy: FetchPolicy,
}

impl<S: TaskStore + 'static> QueueBuilder<S> {
    /// Create a new builder around the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            fetcher: None,
            fetch_policy: FetchPolicy::default(),
        }
    }

    /// Set the fetch backend. Defaults to [`FileFetcher`].
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Set how fetch failures are resolved. Defaults to
    /// [`FetchPolicy::Abort`].
    pub fn fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.fetch_policy = policy;
        self
    }

    /// Build the queue.
    pub fn build(self) -> Queue<S> {
        Queue {
            store: Arc::new(self.store),
            fetcher: self
                .fetcher
                .unwrap_or_else(|| Arc::new(FileFetcher::new())),
            fetch_policy: self.fetch_policy,
        }
    }
}
