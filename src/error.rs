//! Error types for poem-corpus
//!
//! Network- and parse-level faults are handled at the per-item boundary and
//! never surface here; this module covers the faults that abort a run:
//! configuration problems, record store corruption, and I/O failures during
//! append or rewrite. Store absence is deliberately distinguished from store
//! corruption so callers can recover from the former and must not from the
//! latter.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for poem-corpus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for poem-corpus
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "retry.max_workers")
        key: Option<String>,
    },

    /// Record store operation failed
    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error while constructing the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Record-store-specific errors
///
/// `NotFound` and `Corrupt` are separate variants on purpose: a missing log
/// is the normal first-run state and is recovered to an empty result, while
/// a malformed line means the log was damaged and always propagates.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record store file does not exist yet
    #[error("record store not found: {0}")]
    NotFound(PathBuf),

    /// A line in the record store is not a well-formed record
    #[error("record store corrupt at {path}:{line_number}: {source}")]
    Corrupt {
        /// Path of the damaged store file
        path: PathBuf,
        /// 1-based line number of the malformed line
        line_number: usize,
        /// The underlying parse error
        source: serde_json::Error,
    },
}
