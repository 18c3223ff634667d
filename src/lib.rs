//! # poem-corpus
//!
//! Resumable fetch-and-extract pipeline for building a poem interpretation
//! corpus.
//!
//! Given a list of work items (page URL plus pass-through metadata), the
//! pipeline concurrently fetches readable content for each URL with bounded
//! retry rounds, persists every success to an append-only URL-keyed JSONL
//! record store, and can later run an injected extractor over the fetched
//! text. The store is the source of truth for resume: re-running the
//! pipeline never re-fetches a URL it already holds, and a crash mid-run
//! loses at most the current round.
//!
//! ## Design Philosophy
//!
//! - **Resumable by construction** - progress is durable at every round
//!   boundary; re-invocation is always safe and incremental
//! - **Collaborator-driven** - fetching and extraction are injected traits;
//!   the pipeline only knows "URL to optional record" and "text to optional
//!   structured value"
//! - **Library-first** - no CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - consumers subscribe to progress events, no polling
//!   required
//!
//! ## Quick Start
//!
//! ```no_run
//! use poem_corpus::{Config, Pipeline, ReaderFetcher, load_work_items};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         store_path: "poem_success.jsonl".into(),
//!         ..Default::default()
//!     };
//!
//!     let fetcher = ReaderFetcher::new(&config.fetch)?;
//!     let pipeline = Pipeline::new(config, fetcher)?;
//!
//!     // Observe progress
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let items = load_work_items("poem_metadata.json").await?;
//!     let unprocessed = pipeline.run(items).await?;
//!     println!("URLs not successfully fetched: {}", unprocessed);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Extraction stage and extractor collaborator trait
pub mod extract;
/// Fetch worker trait and reader-proxy implementation
pub mod fetch;
/// Work-item input loading
pub mod input;
/// Pipeline driver
pub mod pipeline;
/// Retry scheduler
pub mod scheduler;
/// Append-only JSONL record store
pub mod store;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, FetchConfig, RetryConfig};
pub use error::{Error, Result, StoreError};
pub use extract::{ExtractionStage, Extractor};
pub use fetch::{FetchWorker, ReaderFetcher};
pub use input::load_work_items;
pub use pipeline::Pipeline;
pub use scheduler::fetch_with_retry;
pub use store::RecordStore;
pub use types::{Event, ProcessedRecord, WorkItem};
