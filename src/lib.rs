//! # Crawlfront
//!
//! A durable, self-expanding crawl queue. Work items are persisted tasks
//! that, when executed, may discover and enqueue further tasks, growing an
//! open-ended frontier that a single drain loop runs to exhaustion.
//!
//! - **Durable frontier** - every discovered task is persisted before it
//!   runs, so a crash or restart never loses work
//! - **Self-expanding** - executing a task may enqueue more tasks; the
//!   drain loop re-checks emptiness every iteration
//! - **At-least-once** - a task interrupted mid-execution stays pending
//!   and is re-executed verbatim on the next drain
//! - **Embeddable** - a library, not a service. Runs in your process.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use crawlfront::{FileFetcher, QueueBuilder, SqliteTaskStore, TaskSpec};
//!
//! let store = SqliteTaskStore::open("crawl.sqlite".as_ref()).await?;
//! let queue = QueueBuilder::new(store)
//!     .fetcher(FileFetcher::new())
//!     .build();
//!
//! queue.seed_if_empty(TaskSpec::seed("pages/index.html")).await?;
//! let summary = queue.drain().await?;
//! println!("{} tasks executed", summary.executed);
//! ```
//!
//! ## Task variants
//!
//! Three task kinds share the fetch -> parse -> complete contract:
//!
//! - [`TaskSpec::Seed`] parses a listing page and enqueues one collection
//!   task per discovered link
//! - [`TaskSpec::Collection`] parses a paginated listing into item tasks
//!   and re-enqueues itself with the next page cursor while the content
//!   carries a next-page marker
//! - [`TaskSpec::Item`] parses a terminal page for a titled result and
//!   enqueues nothing
//!
//! ## Feature Flags
//!
//! - `sqlite` (default) - SQLite-backed task store via sqlx
//! - `http` - HTTP fetch backend via reqwest

pub mod extract;
pub mod fetch;
pub mod queue;
pub mod task;

pub use fetch::{FetchError, FetchPolicy, Fetcher, FileFetcher};
pub use queue::{
    DrainSummary, Queue, QueueBuilder, QueueError, StoreError, StoredTask, TaskStore,
};
pub use task::{Task, TaskError, TaskId, TaskSpec, TaskStatus};

#[cfg(feature = "sqlite")]
pub use queue::SqliteTaskStore;

#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
