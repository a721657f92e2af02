//! Crash-resume: pending records survive a restart and only the
//! remainder is re-executed.

#![cfg(feature = "sqlite")]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use crawlfront::{
    FetchError, Fetcher, QueueBuilder, QueueError, SqliteTaskStore, TaskSpec, TaskStore,
};
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct FixtureFetcher {
    pages: HashMap<String, String>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl FixtureFetcher {
    fn new() -> Self {
        Self::default()
    }

    fn page(mut self, target: &str, body: &str) -> Self {
        self.pages.insert(target.to_string(), body.to_string());
        self
    }

    fn log(&self) -> Arc<Mutex<Vec<String>>> {
        self.fetched.clone()
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn fetch(&self, target: &str) -> Result<String, FetchError> {
        self.fetched.lock().await.push(target.to_string());
        match self.pages.get(target) {
            Some(body) => Ok(body.clone()),
            None => Err(FetchError::new(target, anyhow::anyhow!("no fixture"))),
        }
    }
}

#[tokio::test]
async fn interrupted_drain_resumes_with_the_remainder() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.sqlite");

    // First process: four items enqueued, the third target unreachable.
    {
        let store = SqliteTaskStore::open(&db_path).await.unwrap();
        let fetcher = FixtureFetcher::new()
            .page("i1", "<h1>One</h1>")
            .page("i2", "<h1>Two</h1>");
        let queue = QueueBuilder::new(store).fetcher(fetcher).build();

        for url in ["i1", "i2", "i3", "i4"] {
            queue.enqueue(TaskSpec::item(url)).await.unwrap();
        }

        let err = queue.drain().await.unwrap_err();
        assert!(matches!(err, QueueError::Fetch(_)));
    }

    // Restart: reopen the same database, all targets now reachable.
    let store = SqliteTaskStore::open(&db_path).await.unwrap();
    let fetcher = FixtureFetcher::new()
        .page("i1", "<h1>One</h1>")
        .page("i2", "<h1>Two</h1>")
        .page("i3", "<h1>Three</h1>")
        .page("i4", "<h1>Four</h1>");
    let log = fetcher.log();
    let queue = QueueBuilder::new(store.clone()).fetcher(fetcher).build();

    let summary = queue.drain().await.unwrap();

    // Exactly the two interrupted records run; done records never re-run.
    assert_eq!(summary.executed, 2);
    assert_eq!(*log.lock().await, vec!["i3", "i4"]);
    assert_eq!(store.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn restart_does_not_reseed_a_queue_with_pending_work() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.sqlite");

    {
        let store = SqliteTaskStore::open(&db_path).await.unwrap();
        let queue = QueueBuilder::new(store).build();
        queue
            .seed_if_empty(TaskSpec::seed("site/index.html"))
            .await
            .unwrap();
    }

    let store = SqliteTaskStore::open(&db_path).await.unwrap();
    let queue = QueueBuilder::new(store.clone()).build();
    let seeded = queue
        .seed_if_empty(TaskSpec::seed("site/index.html"))
        .await
        .unwrap();

    assert_eq!(seeded, None);
    assert_eq!(store.pending_count().await.unwrap(), 1);
}
