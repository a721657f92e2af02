//! Fetch collaborator: the seam between tasks and content retrieval.

use async_trait::async_trait;
use thiserror::Error;

/// Error returned when a target could not be fetched.
#[derive(Error, Debug)]
#[error("fetch failed for '{target}': {source}")]
pub struct FetchError {
    /// The locator that was being fetched.
    pub target: String,
    #[source]
    pub source: anyhow::Error,
}

impl FetchError {
    /// Create a fetch error for the given target.
    pub fn new(target: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
        }
    }
}

/// How the drain loop resolves a fetch failure.
///
/// The queue applies one policy uniformly; there is no per-task override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Propagate the error. The drain aborts and the record stays pending,
    /// to be re-executed verbatim on the next drain.
    #[default]
    Abort,
    /// Substitute empty content. Parsing finds nothing, the task completes,
    /// and the drain continues with the next record.
    TreatAsEmpty,
}

/// Retrieves raw content for a task's target.
///
/// No retry or timeout is applied by the queue; implementations own both.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the content behind `target`.
    async fn fetch(&self, target: &str) -> Result<String, FetchError>;
}

/// Fetcher that treats targets as filesystem paths.
///
/// Useful for fixtures, demos, and crawling mirrored page trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl FileFetcher {
    /// Create a new file fetcher.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, target: &str) -> Result<String, FetchError> {
        tokio::fs::read_to_string(target)
            .await
            .map_err(|e| FetchError::new(target, e))
    }
}

/// Fetcher that issues HTTP GET requests.
///
/// Non-2xx responses are fetch failures.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    /// Create a fetcher around an existing client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
impl Default for HttpFetcher {
    fn default() -> Self {
        // Some listing sites refuse requests without a browser user agent.
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64)")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(target)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::new(target, e))?;

        response.text().await.map_err(|e| FetchError::new(target, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_fetcher_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<h1>hello</h1>").unwrap();

        let fetched = FileFetcher::new()
            .fetch(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(fetched, "<h1>hello</h1>");
    }

    #[tokio::test]
    async fn file_fetcher_reports_missing_target() {
        let err = FileFetcher::new().fetch("/no/such/file").await.unwrap_err();
        assert_eq!(err.target, "/no/such/file");
    }
}
