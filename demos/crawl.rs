//! Seed-and-drain demo against the bundled HTML fixtures.
//!
//! Run from the repository root:
//!
//! ```text
//! cargo run --example crawl
//! ```
//!
//! The queue persists to `demos/crawl.sqlite`, so a second run finds the
//! frontier already drained and executes nothing. Delete the database file
//! to crawl from scratch, or kill a run partway to watch it resume.

use std::path::Path;

use crawlfront::{FileFetcher, QueueBuilder, SqliteTaskStore, TaskSpec};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let store = SqliteTaskStore::open(Path::new("demos/crawl.sqlite")).await?;
    let queue = QueueBuilder::new(store)
        .fetcher(FileFetcher::new())
        .build();

    if let Some(id) = queue
        .seed_if_empty(TaskSpec::seed("demos/fixtures/index.html"))
        .await?
    {
        println!("seeded root task {id}");
    } else {
        println!("queue already has work; resuming");
    }

    let summary = queue.drain().await?;
    println!("drained: {} tasks executed", summary.executed);
    Ok(())
}
