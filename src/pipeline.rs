//! Pipeline driver: compute remaining work, run the scheduler, report
//!
//! The driver is what makes re-invocation safe and incremental: it diffs the
//! full work set against the record store before dispatching anything, so a
//! URL fetched in an earlier run is never fetched again, and the final
//! unprocessed count is computed against the original full set, so a fully
//! successful prior run reports zero without doing any work.

use crate::config::Config;
use crate::error::Result;
use crate::fetch::FetchWorker;
use crate::scheduler::fetch_with_retry;
use crate::store::RecordStore;
use crate::types::{Event, WorkItem};
use std::collections::HashSet;
use tokio::sync::broadcast;

/// Buffered events before a slow subscriber starts seeing `Lagged`
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// The fetch pipeline: record store, retry scheduler, and a fetch worker
/// wired together under one configuration
pub struct Pipeline<W> {
    config: Config,
    store: RecordStore,
    worker: W,
    event_tx: broadcast::Sender<Event>,
}

impl<W: FetchWorker> Pipeline<W> {
    /// Build a pipeline from a validated configuration and a fetch worker
    pub fn new(config: Config, worker: W) -> Result<Self> {
        config.validate()?;
        let store = RecordStore::new(&config.store_path);
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            store,
            worker,
            event_tx,
        })
    }

    /// The record store this pipeline appends to
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Subscribe to pipeline progress events
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Run the pipeline over the full work set.
    ///
    /// Loads prior progress from the record store, fetches only the items
    /// whose URL is not already present, and returns the number of distinct
    /// URLs in `all_items` still unprocessed after the run. A non-zero
    /// count is not an error; the store's resumability makes running again
    /// later safe and incremental.
    pub async fn run(&self, all_items: Vec<WorkItem>) -> Result<usize> {
        let processed = self.store.processed_urls().await?;
        let all_urls: HashSet<String> = all_items.iter().map(|item| item.url.clone()).collect();

        let remaining: Vec<WorkItem> = all_items
            .into_iter()
            .filter(|item| !processed.contains(&item.url))
            .collect();

        tracing::info!(
            total = all_urls.len(),
            already_processed = all_urls.len() - remaining.len(),
            remaining = remaining.len(),
            "starting pipeline run"
        );

        if !remaining.is_empty() {
            let failed = fetch_with_retry(
                &self.config.retry,
                &self.store,
                &self.worker,
                remaining,
                &self.event_tx,
            )
            .await?;

            if !failed.is_empty() {
                tracing::warn!(failed = failed.len(), "items not fetched in this run");
            }
        }

        // Count against the original full set, not just this run's remainder
        let processed = self.store.processed_urls().await?;
        let unprocessed = all_urls
            .iter()
            .filter(|url| !processed.contains(*url))
            .count();

        tracing::info!(unprocessed, "pipeline run finished");
        Ok(unprocessed)
    }
}
