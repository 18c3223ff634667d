//! Core types and events

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload field holding the readable page content produced by a fetch
pub const MARKDOWN_FIELD: &str = "markdown";

/// Payload field holding the structured record produced by extraction
pub const CLEAN_TEXT_FIELD: &str = "clean_text";

/// Payload field holding the unix timestamp of a successful fetch
pub const FETCHED_AT_FIELD: &str = "fetched_at";

/// A unit of work in the pipeline: one page to fetch.
///
/// Identity is the `url`; everything else (`title`, `author`, and whatever
/// other fields the metadata crawl produced) is carried opaquely in `extra`
/// and passed through to the [`ProcessedRecord`] on success. Work items are
/// immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Page URL, the identity key for deduplication and resume
    pub url: String,

    /// Domain-specific fields the pipeline does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkItem {
    /// Create a work item with no extra fields
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extra: Map::new(),
        }
    }

    /// Attach a pass-through field to this work item
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// A successfully processed item, serialized as one line of the record store.
///
/// One record per unique `url` after deduplication; when duplicates exist,
/// the record appended last supersedes earlier ones. The `payload` carries
/// whatever the producing stage emitted (fetched markdown, extracted
/// structured text); the store does not interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    /// Page URL, the identity key
    pub url: String,

    /// Stage-specific result fields
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ProcessedRecord {
    /// Create a record with no payload fields
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            payload: Map::new(),
        }
    }

    /// Attach a payload field to this record
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

/// Pipeline progress events.
///
/// Emitted on a broadcast channel so consumers can observe progress without
/// polling. Events are informational only: dropping or lagging behind them
/// never affects the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// One item was fetched and will be appended at the round boundary
    ItemFetched {
        /// URL of the fetched item
        url: String,
    },

    /// A retry round finished and its successes were persisted
    RoundCompleted {
        /// 1-based round number
        round: u32,
        /// Items fetched in this round
        succeeded: usize,
        /// Items still failing after this round
        remaining: usize,
    },

    /// The retry budget ran out with items still unfetched
    RetriesExhausted {
        /// Items given up on in this run
        remaining: usize,
    },
}
