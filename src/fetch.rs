//! Fetch worker: one attempt to obtain readable content for a URL
//!
//! The scheduler only sees `Option<ProcessedRecord>`: `None` is the single
//! recoverable-failure signal, whatever went wrong underneath. Workers must
//! convert their own faults (non-success status, timeouts, connection
//! errors) into `None` so a bad item can never abort a round; it just stays
//! in the failure set for the next one.

use crate::config::FetchConfig;
use crate::error::Result;
use crate::types::{FETCHED_AT_FIELD, MARKDOWN_FIELD, ProcessedRecord, WorkItem};
use async_trait::async_trait;
use url::Url;

/// A collaborator that maps a work item to an optional processed record
///
/// Implementations perform exactly one attempt per call; retry policy lives
/// in the scheduler, not here.
#[async_trait]
pub trait FetchWorker: Send + Sync {
    /// Attempt to fetch content for `item`
    ///
    /// Returns `Some` on success, `None` on any recoverable failure.
    async fn attempt(&self, item: &WorkItem) -> Option<ProcessedRecord>;
}

#[async_trait]
impl<W: FetchWorker + ?Sized> FetchWorker for std::sync::Arc<W> {
    async fn attempt(&self, item: &WorkItem) -> Option<ProcessedRecord> {
        (**self).attempt(item).await
    }
}

/// Fetches readable page content through a reader proxy.
///
/// The target URL is the page URL appended verbatim to the configured
/// reader prefix (e.g. `https://r.jina.ai/https://example.com/poem`), which
/// returns the page rendered as markdown. A successful response produces a
/// record carrying the work item's pass-through fields plus the body under
/// [`MARKDOWN_FIELD`] and a fetch timestamp under [`FETCHED_AT_FIELD`].
#[derive(Debug, Clone)]
pub struct ReaderFetcher {
    client: reqwest::Client,
    reader_base: String,
}

impl ReaderFetcher {
    /// Build a fetcher from the given configuration
    ///
    /// Fails with a keyed configuration error when the reader base URL does
    /// not parse, or a network error when the HTTP client cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Url::parse(&config.reader_base_url).map_err(|e| crate::Error::Config {
            message: format!("invalid reader base URL: {}", e),
            key: Some("fetch.reader_base_url".to_string()),
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            reader_base: config.reader_base_url.clone(),
        })
    }
}

#[async_trait]
impl FetchWorker for ReaderFetcher {
    async fn attempt(&self, item: &WorkItem) -> Option<ProcessedRecord> {
        let target = format!("{}{}", self.reader_base, item.url);

        let response = match self.client.get(&target).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %item.url, error = %e, "fetch request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %item.url, status = %status, "fetch returned non-success status");
            return None;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url = %item.url, error = %e, "failed to read fetch response body");
                return None;
            }
        };

        let mut record = ProcessedRecord::new(&item.url);
        record.payload = item.extra.clone();
        record
            .payload
            .insert(MARKDOWN_FIELD.to_string(), body.into());
        record.payload.insert(
            FETCHED_AT_FIELD.to_string(),
            chrono::Utc::now().timestamp().into(),
        );
        Some(record)
    }
}
