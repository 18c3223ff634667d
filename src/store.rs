//! Append-only JSONL record store with idempotent resume support
//!
//! One [`ProcessedRecord`] per line, UTF-8, appended as items succeed so
//! partial progress survives a crash. The store is the only shared mutable
//! resource in the pipeline; a single process appending is the supported
//! mode (no file locking, so concurrent runs against the same store are
//! unsafe).

use crate::error::{Result, StoreError};
use crate::types::ProcessedRecord;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Durable, URL-keyed log of successfully processed items
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Create a handle to the store at `path`
    ///
    /// The file is not touched until the first append; a store whose file
    /// does not exist yet simply loads as empty.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record in the log, in append order.
    ///
    /// Fails with [`StoreError::NotFound`] when the file does not exist and
    /// [`StoreError::Corrupt`] when a line is not a well-formed record.
    /// Most callers want [`load`](Self::load), which recovers from the
    /// missing-file case.
    pub async fn try_load(&self) -> Result<Vec<ProcessedRecord>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()).into());
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: ProcessedRecord =
                serde_json::from_str(line).map_err(|source| StoreError::Corrupt {
                    path: self.path.clone(),
                    line_number: index + 1,
                    source,
                })?;
            records.push(record);
        }
        Ok(records)
    }

    /// Load every record in the log, treating a missing file as empty.
    ///
    /// This is the normal first-run path: no store yet means no prior
    /// progress. Corruption still propagates: a damaged store must not be
    /// silently mistaken for an empty one.
    pub async fn load(&self) -> Result<Vec<ProcessedRecord>> {
        match self.try_load().await {
            Ok(records) => Ok(records),
            Err(crate::Error::Store(StoreError::NotFound(_))) => {
                tracing::debug!(path = %self.path.display(), "record store absent, starting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Set of URLs already present in the log
    pub async fn processed_urls(&self) -> Result<HashSet<String>> {
        let records = self.load().await?;
        Ok(records.into_iter().map(|r| r.url).collect())
    }

    /// Append records to the log, one line each, in the order given.
    ///
    /// Existing lines are never rewritten or reordered. The whole batch is
    /// written with a single call, so completion callbacks within one round
    /// need no finer-grained locking. Append faults propagate and abort the
    /// run, on the assumption that disk errors are not retry-worthy.
    pub async fn append(&self, records: &[ProcessedRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut buf = String::new();
        for record in records {
            buf.push_str(&serde_json::to_string(record)?);
            buf.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(
            path = %self.path.display(),
            appended = records.len(),
            "appended records to store"
        );
        Ok(())
    }

    /// Collapse the log to exactly one record per unique URL and rewrite it.
    ///
    /// Later occurrences of a URL overwrite earlier ones (last write wins)
    /// while the retained record keeps the position of the URL's first
    /// appearance. Destructive: pre-deduplication duplicates cannot be
    /// recovered afterwards.
    pub async fn deduplicate(&self) -> Result<Vec<ProcessedRecord>> {
        let records = self.load().await?;
        let total = records.len();

        let mut order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, ProcessedRecord> = HashMap::new();
        for record in records {
            if !latest.contains_key(&record.url) {
                order.push(record.url.clone());
            }
            latest.insert(record.url.clone(), record);
        }

        let deduped: Vec<ProcessedRecord> =
            order.iter().filter_map(|url| latest.remove(url)).collect();

        let mut buf = String::new();
        for record in &deduped {
            buf.push_str(&serde_json::to_string(record)?);
            buf.push('\n');
        }
        tokio::fs::write(&self.path, buf.as_bytes()).await?;

        tracing::info!(
            path = %self.path.display(),
            total,
            unique = deduped.len(),
            "deduplicated record store"
        );
        Ok(deduped)
    }
}
