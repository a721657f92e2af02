//! Task types and the fetch -> parse -> complete execution contract.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::extract;
use crate::fetch::{FetchError, FetchPolicy, Fetcher};
use crate::queue::store::{StoreError, TaskStore};

/// Unique identifier for a task, assigned by the store on first enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a task.
///
/// There is no in-progress state: a task interrupted between dequeue and
/// completion stays `Pending` and is re-executed verbatim on the next
/// drain. That is safe because execution is idempotent scraping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Persisted but not yet executed to completion.
    Pending,
    /// Executed; never transitions back.
    Done,
}

fn first_page() -> u32 {
    1
}

/// The variant-tagged payload of a task: what to fetch and how to parse it.
///
/// This is the persisted form. The `variant` tag makes the stored record
/// inspectable and keeps decoding explicit; an unknown tag surfaces as a
/// deserialization error instead of a silently skipped record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum TaskSpec {
    /// Listing page whose links each become a [`TaskSpec::Collection`].
    Seed { url: String },
    /// Paginated listing. Links become [`TaskSpec::Item`] tasks; a
    /// next-page marker in the content enqueues the same collection with
    /// `page + 1`. This is the rule that makes the frontier open-ended.
    Collection {
        url: String,
        #[serde(default = "first_page")]
        page: u32,
    },
    /// Terminal page parsed for a titled result. Enqueues nothing.
    Item { url: String },
}

impl TaskSpec {
    /// A seed task for a listing page.
    pub fn seed(url: impl Into<String>) -> Self {
        Self::Seed { url: url.into() }
    }

    /// A collection task starting at the first page.
    pub fn collection(url: impl Into<String>) -> Self {
        Self::Collection {
            url: url.into(),
            page: first_page(),
        }
    }

    /// An item task for a terminal page.
    pub fn item(url: impl Into<String>) -> Self {
        Self::Item { url: url.into() }
    }

    /// The variant tag, for logging.
    pub fn variant(&self) -> &'static str {
        match self {
            Self::Seed { .. } => "seed",
            Self::Collection { .. } => "collection",
            Self::Item { .. } => "item",
        }
    }
}

/// Error raised while executing a task.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The task was never enqueued, so it has no record to complete.
    #[error("task has not been enqueued; no record id to complete")]
    Unpersisted,
}

/// A unit of work: identity, status, and a variant payload.
///
/// Tasks come in two shapes: freshly constructed (`id` is `None` until the
/// store assigns one) and dequeued from a record (`id` installed from the
/// record, immutable from then on).
#[derive(Debug, Clone)]
pub struct Task {
    id: Option<TaskId>,
    status: TaskStatus,
    spec: TaskSpec,
}

impl Task {
    /// A new, not-yet-persisted task.
    pub fn new(spec: TaskSpec) -> Self {
        Self {
            id: None,
            status: TaskStatus::Pending,
            spec,
        }
    }

    /// Rebuild a task from its persisted record.
    pub(crate) fn from_record(id: TaskId, spec: TaskSpec) -> Self {
        Self {
            id: Some(id),
            status: TaskStatus::Pending,
            spec,
        }
    }

    /// The store-assigned id, or `None` before first enqueue.
    pub fn id(&self) -> Option<TaskId> {
        self.id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    /// The locator to fetch.
    ///
    /// Collections compute this dynamically: pages past the first append a
    /// `page` query parameter to the stored url.
    pub fn target(&self) -> String {
        match &self.spec {
            TaskSpec::Seed { url } | TaskSpec::Item { url } => url.clone(),
            TaskSpec::Collection { url, page } => {
                if *page <= 1 {
                    url.clone()
                } else if url.contains('?') {
                    format!("{url}&page={page}")
                } else {
                    format!("{url}?page={page}")
                }
            }
        }
    }

    /// Execute the task: fetch the target, parse the content (which may
    /// enqueue follow-up tasks through `store`), then complete.
    ///
    /// The three sub-steps run in strict order; the enqueue capability is
    /// the store handle passed here at dispatch time, never a global. A
    /// fetch failure is resolved by `policy` before parsing begins.
    pub async fn execute<S>(
        &mut self,
        fetcher: &dyn Fetcher,
        store: &S,
        policy: FetchPolicy,
    ) -> Result<(), TaskError>
    where
        S: TaskStore + ?Sized,
    {
        if self.id.is_none() {
            return Err(TaskError::Unpersisted);
        }

        let target = self.target();
        let content = match fetcher.fetch(&target).await {
            Ok(content) => content,
            Err(err) => match policy {
                FetchPolicy::Abort => return Err(err.into()),
                FetchPolicy::TreatAsEmpty => {
                    warn!(url = %target, error = %err, "fetch failed; continuing with empty content");
                    String::new()
                }
            },
        };
        debug!(url = %target, bytes = content.len(), "fetched");

        self.parse(&content, store).await?;
        self.complete(store).await
    }

    /// Variant dispatch over the fetched content.
    async fn parse<S>(&self, content: &str, store: &S) -> Result<(), StoreError>
    where
        S: TaskStore + ?Sized,
    {
        match &self.spec {
            TaskSpec::Seed { .. } => {
                let found = extract::links(content);
                info!(count = found.len(), "collections discovered");
                for url in found {
                    store.enqueue(&TaskSpec::collection(url)).await?;
                }
            }
            TaskSpec::Collection { url, page } => {
                let found = extract::links(content);
                info!(count = found.len(), page, "items discovered");
                for item_url in found {
                    store.enqueue(&TaskSpec::item(item_url)).await?;
                }
                if extract::has_next(content) {
                    debug!(page = page + 1, "next-page marker present");
                    store
                        .enqueue(&TaskSpec::Collection {
                            url: url.clone(),
                            page: page + 1,
                        })
                        .await?;
                }
            }
            TaskSpec::Item { .. } => match extract::title(content) {
                Some(title) => info!(title = %title, "item parsed"),
                None => debug!("no title in item content"),
            },
        }
        Ok(())
    }

    /// Transition to `Done` and persist it. Idempotent at the store level.
    pub(crate) async fn complete<S>(&mut self, store: &S) -> Result<(), TaskError>
    where
        S: TaskStore + ?Sized,
    {
        let id = self.id.ok_or(TaskError::Unpersisted)?;
        self.status = TaskStatus::Done;
        store.mark_done(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_round_trips_per_variant() {
        let specs = [
            TaskSpec::seed("idx.html"),
            TaskSpec::Collection {
                url: "cat.html".into(),
                page: 7,
            },
            TaskSpec::item("post.html"),
        ];
        for spec in specs {
            let encoded = serde_json::to_string(&spec).unwrap();
            let decoded: TaskSpec = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, spec);
            assert_eq!(decoded.variant(), spec.variant());
        }
    }

    #[test]
    fn encoded_spec_carries_variant_tag() {
        let encoded = serde_json::to_value(TaskSpec::seed("idx.html")).unwrap();
        assert_eq!(encoded["variant"], "seed");
    }

    #[test]
    fn unknown_variant_tag_is_rejected() {
        let result = serde_json::from_str::<TaskSpec>(r#"{"variant":"warp_drive","url":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn collection_page_defaults_to_one() {
        let decoded: TaskSpec =
            serde_json::from_str(r#"{"variant":"collection","url":"cat.html"}"#).unwrap();
        assert_eq!(
            decoded,
            TaskSpec::Collection {
                url: "cat.html".into(),
                page: 1
            }
        );
    }

    #[test]
    fn collection_target_appends_page_cursor() {
        let first = Task::new(TaskSpec::collection("cat.html"));
        assert_eq!(first.target(), "cat.html");

        let third = Task::new(TaskSpec::Collection {
            url: "cat.html".into(),
            page: 3,
        });
        assert_eq!(third.target(), "cat.html?page=3");

        let with_query = Task::new(TaskSpec::Collection {
            url: "search?genre=drama".into(),
            page: 2,
        });
        assert_eq!(with_query.target(), "search?genre=drama&page=2");
    }

    #[test]
    fn new_task_is_pending_without_id() {
        let task = Task::new(TaskSpec::item("post.html"));
        assert_eq!(task.id(), None);
        assert_eq!(task.status(), TaskStatus::Pending);
    }
}
