//! End-to-end pipeline tests: resume, retry budget, dedup, reporting.

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use poem_corpus::{
    Config, FetchWorker, Pipeline, ProcessedRecord, RecordStore, RetryConfig, WorkItem,
    types::MARKDOWN_FIELD,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// Worker that fails each URL a scripted number of times before succeeding
struct ScriptedWorker {
    fail_first: HashMap<String, u32>,
    attempts: Mutex<HashMap<String, u32>>,
}

impl ScriptedWorker {
    fn new(fail_first: &[(&str, u32)]) -> Self {
        Self {
            fail_first: fail_first
                .iter()
                .map(|(url, n)| (url.to_string(), *n))
                .collect(),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    fn attempts_for(&self, url: &str) -> u32 {
        self.attempts
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl FetchWorker for ScriptedWorker {
    async fn attempt(&self, item: &WorkItem) -> Option<ProcessedRecord> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let counter = attempts.entry(item.url.clone()).or_insert(0);
            *counter += 1;
            *counter
        };

        let fail_first = self.fail_first.get(&item.url).copied().unwrap_or(0);
        if attempt <= fail_first {
            None
        } else {
            Some(ProcessedRecord::new(&item.url).with_field(MARKDOWN_FIELD, format!("# {}", item.url)))
        }
    }
}

fn config_in(dir: &TempDir, max_retries: u32) -> Config {
    Config {
        retry: RetryConfig {
            max_retries,
            max_workers: 2,
            round_delay: Duration::from_millis(1),
            jitter: false,
        },
        store_path: dir.path().join("success.jsonl"),
        ..Config::default()
    }
}

fn items(urls: &[&str]) -> Vec<WorkItem> {
    urls.iter().map(|url| WorkItem::new(*url)).collect()
}

#[tokio::test]
async fn transient_failure_recovered_within_budget() {
    // "b" fails on rounds 1-2, succeeds on round 3; budget of 5 is enough
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        config_in(&dir, 5),
        ScriptedWorker::new(&[("b", 2)]),
    )
    .unwrap();

    let unprocessed = pipeline.run(items(&["a", "b", "c"])).await.unwrap();
    assert_eq!(unprocessed, 0);

    let records = pipeline.store().load().await.unwrap();
    assert_eq!(records.len(), 3);
    let mut urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    urls.sort_unstable();
    assert_eq!(urls, ["a", "b", "c"]);
}

#[tokio::test]
async fn permanent_failure_reported_after_budget() {
    // "c" never succeeds; with a budget of 2 it stays unprocessed
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        config_in(&dir, 2),
        ScriptedWorker::new(&[("c", u32::MAX)]),
    )
    .unwrap();

    let unprocessed = pipeline.run(items(&["a", "b", "c"])).await.unwrap();
    assert_eq!(unprocessed, 1);

    let records = pipeline.store().load().await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.url != "c"));
}

#[tokio::test]
async fn second_run_is_idempotent_and_picks_up_stragglers() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("success.jsonl");

    // First run: "c" keeps failing and exhausts the budget
    {
        let pipeline = Pipeline::new(
            config_in(&dir, 2),
            ScriptedWorker::new(&[("c", u32::MAX)]),
        )
        .unwrap();
        let unprocessed = pipeline.run(items(&["a", "b", "c"])).await.unwrap();
        assert_eq!(unprocessed, 1);
    }

    let after_first = RecordStore::new(&store_path).load().await.unwrap();

    // Second run: "c" now succeeds; "a" and "b" must not be re-fetched
    {
        let worker = ScriptedWorker::new(&[]);
        let pipeline = Pipeline::new(config_in(&dir, 2), worker).unwrap();
        let unprocessed = pipeline.run(items(&["a", "b", "c"])).await.unwrap();
        assert_eq!(unprocessed, 0);
    }

    let after_second = RecordStore::new(&store_path).load().await.unwrap();
    assert_eq!(after_second.len(), 3);
    // The store only grew by appending; prior lines are untouched
    assert_eq!(&after_second[..after_first.len()], &after_first[..]);
    assert_eq!(after_second[2].url, "c");
}

#[tokio::test]
async fn already_processed_urls_never_refetched() {
    let dir = TempDir::new().unwrap();

    {
        let pipeline = Pipeline::new(config_in(&dir, 3), ScriptedWorker::new(&[])).unwrap();
        pipeline.run(items(&["a", "b"])).await.unwrap();
    }

    let worker = ScriptedWorker::new(&[]);
    let pipeline = Pipeline::new(config_in(&dir, 3), worker).unwrap();
    let unprocessed = pipeline.run(items(&["a", "b"])).await.unwrap();

    assert_eq!(unprocessed, 0);
    assert_eq!(pipeline.store().load().await.unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_store_entries_collapse_to_last_appended() {
    // Simulates overlapping historical runs that appended "x" twice
    let dir = TempDir::new().unwrap();
    let store = RecordStore::new(dir.path().join("success.jsonl"));

    store
        .append(&[
            ProcessedRecord::new("x").with_field(MARKDOWN_FIELD, "stale"),
            ProcessedRecord::new("y").with_field(MARKDOWN_FIELD, "Y"),
            ProcessedRecord::new("x").with_field(MARKDOWN_FIELD, "fresh"),
        ])
        .await
        .unwrap();

    let deduped = store.deduplicate().await.unwrap();
    assert_eq!(deduped.len(), 2);
    assert_eq!(deduped[0].url, "x");
    assert_eq!(deduped[0].payload[MARKDOWN_FIELD], "fresh");

    // A pipeline run over the deduplicated store still resumes correctly
    let pipeline = Pipeline::new(config_in(&dir, 3), ScriptedWorker::new(&[])).unwrap();
    let unprocessed = pipeline.run(items(&["x", "y"])).await.unwrap();
    assert_eq!(unprocessed, 0);
}

#[tokio::test]
async fn unprocessed_count_is_exact_for_partial_overlap() {
    // Input contains URLs the store has never seen and ones it already has
    let dir = TempDir::new().unwrap();
    let store = RecordStore::new(dir.path().join("success.jsonl"));
    store
        .append(&[ProcessedRecord::new("a").with_field(MARKDOWN_FIELD, "A")])
        .await
        .unwrap();

    let worker = ScriptedWorker::new(&[("d", u32::MAX)]);
    let pipeline = Pipeline::new(config_in(&dir, 2), worker).unwrap();

    let unprocessed = pipeline.run(items(&["a", "b", "c", "d"])).await.unwrap();
    assert_eq!(unprocessed, 1, "only the permanently failing URL remains");
    assert_eq!(pipeline.store().load().await.unwrap().len(), 3);
}

#[tokio::test]
async fn retry_attempts_bounded_per_url() {
    let dir = TempDir::new().unwrap();
    let worker = std::sync::Arc::new(ScriptedWorker::new(&[("a", u32::MAX)]));
    let pipeline = Pipeline::new(config_in(&dir, 4), worker.clone()).unwrap();

    let unprocessed = pipeline.run(items(&["a"])).await.unwrap();
    assert_eq!(unprocessed, 1);
    assert_eq!(worker.attempts_for("a"), 4, "one attempt per round, no more");
    assert!(pipeline.store().load().await.unwrap().is_empty());
}
