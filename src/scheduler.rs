//! Retry scheduler: bounded rounds of concurrent fetch attempts
//!
//! Each round dispatches one attempt per still-failing item, at most
//! `max_workers` in flight at once, waits for the whole round to finish
//! (round-barrier, no cancellation), persists the round's successes in a
//! single append, and carries the remainder into the next round after a
//! short delay. The failure set shrinks monotonically; the loop ends when
//! it is empty or the retry budget is spent. Both are normal termination.

use crate::config::RetryConfig;
use crate::error::Result;
use crate::fetch::FetchWorker;
use crate::store::RecordStore;
use crate::types::{Event, ProcessedRecord, WorkItem};
use futures::stream::{self, StreamExt};
use rand::Rng;
use std::time::Duration;
use tokio::sync::broadcast;

/// Drive retry rounds over `items` until every item succeeds or the retry
/// budget is exhausted.
///
/// Successes are appended to `store` at each round boundary, so a crash
/// mid-run loses at most the current round. Within a round, results arrive
/// in completion order, not submission order; callers must not assume the
/// original ordering survives.
///
/// Returns the items still failing after the final round; an empty vector
/// means everything was fetched. The returned set is never silently
/// dropped; callers report it.
pub async fn fetch_with_retry<W: FetchWorker>(
    config: &RetryConfig,
    store: &RecordStore,
    worker: &W,
    items: Vec<WorkItem>,
    event_tx: &broadcast::Sender<Event>,
) -> Result<Vec<WorkItem>> {
    let mut failures = items;
    let mut round: u32 = 0;

    while !failures.is_empty() && round < config.max_retries {
        round += 1;
        tracing::info!(
            round,
            max_retries = config.max_retries,
            pending = failures.len(),
            "starting fetch round"
        );

        let pending = std::mem::take(&mut failures);
        let results: Vec<(WorkItem, Option<ProcessedRecord>)> = stream::iter(pending)
            .map(|item| async move {
                let record = worker.attempt(&item).await;
                (item, record)
            })
            .buffer_unordered(config.max_workers)
            .collect()
            .await;

        let mut successes = Vec::new();
        let mut current_failures = Vec::new();
        for (item, record) in results {
            match record {
                Some(record) => {
                    // Events may have no subscribers; that is fine
                    let _ = event_tx.send(Event::ItemFetched {
                        url: record.url.clone(),
                    });
                    successes.push(record);
                }
                None => current_failures.push(item),
            }
        }

        // Durability checkpoint: one append per round, not per item
        store.append(&successes).await?;

        tracing::info!(
            round,
            succeeded = successes.len(),
            remaining = current_failures.len(),
            "fetch round completed"
        );
        let _ = event_tx.send(Event::RoundCompleted {
            round,
            succeeded: successes.len(),
            remaining: current_failures.len(),
        });

        failures = current_failures;

        // Load-shedding against the remote server between rounds
        if !failures.is_empty() && round < config.max_retries {
            let delay = if config.jitter {
                add_jitter(config.round_delay)
            } else {
                config.round_delay
            };
            tokio::time::sleep(delay).await;
        }
    }

    if !failures.is_empty() {
        tracing::warn!(
            remaining = failures.len(),
            max_retries = config.max_retries,
            "giving up with items still unfetched"
        );
        let _ = event_tx.send(Event::RetriesExhausted {
            remaining: failures.len(),
        });
    }

    Ok(failures)
}

/// Add random jitter to a delay to avoid hammering the server on a fixed
/// cadence
///
/// Jitter is uniformly distributed between 0% and 100% of the delay, so the
/// actual delay falls between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
