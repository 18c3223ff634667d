//! Extraction stage: run an injected extractor over fetched text
//!
//! The extractor (in practice an LLM prompted to pull poem/interpretation
//! pairs out of page markdown) is an explicitly constructed collaborator
//! passed in by the caller, never ambient module state. Parse failures are
//! logged and the item is dropped, not retried: feeding the same text back
//! to the model would only burn compute on the same malformed answer.

use crate::error::Result;
use crate::store::RecordStore;
use crate::types::{CLEAN_TEXT_FIELD, MARKDOWN_FIELD, ProcessedRecord};
use async_trait::async_trait;
use serde_json::Value;

/// A collaborator that maps raw text to an optional structured record
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract a structured record from `text`
    ///
    /// Returns `None` when the output is not well-formed structured data.
    async fn extract(&self, text: &str) -> Option<Value>;
}

/// Drives the extractor over a store of fetched records, resumably.
///
/// URLs already present in the corpus store are skipped, so re-invocation
/// after a crash or a partial run only processes new material. Each
/// extracted record is appended immediately.
pub struct ExtractionStage<E> {
    extractor: E,
}

impl<E: Extractor> ExtractionStage<E> {
    /// Create a stage around an already-initialized extractor
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }

    /// Consume the stage, returning the extractor for shutdown by its owner
    pub fn into_extractor(self) -> E {
        self.extractor
    }

    /// Extract structured records from every unprocessed record in `source`
    /// and append them to `corpus`
    ///
    /// Returns the number of records extracted in this run. Records without
    /// a text payload, and records the extractor cannot parse, are skipped
    /// with a warning.
    pub async fn run(&self, source: &RecordStore, corpus: &RecordStore) -> Result<usize> {
        let records = source.load().await?;
        let done = corpus.processed_urls().await?;
        tracing::info!(
            total = records.len(),
            already_extracted = done.len(),
            "starting extraction"
        );

        let mut extracted = 0usize;
        for record in records {
            if done.contains(&record.url) {
                continue;
            }

            let Some(text) = record.payload.get(MARKDOWN_FIELD).and_then(Value::as_str) else {
                tracing::warn!(url = %record.url, "record has no text payload, skipping");
                continue;
            };

            match self.extractor.extract(text).await {
                Some(value) => {
                    let out = ProcessedRecord::new(&record.url).with_field(CLEAN_TEXT_FIELD, value);
                    corpus.append(&[out]).await?;
                    extracted += 1;
                }
                None => {
                    tracing::warn!(url = %record.url, "extraction produced no well-formed record, dropping");
                }
            }
        }

        tracing::info!(extracted, "extraction finished");
        Ok(extracted)
    }
}
