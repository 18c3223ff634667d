//! Work-item input loading
//!
//! The initial work set comes from a JSON array file produced by the
//! metadata crawl (url/title/author per entry). Unlike the record store, a
//! missing input file is a hard error: there is nothing sensible to do
//! without it.

use crate::error::Result;
use crate::types::WorkItem;
use std::path::Path;

/// Load the full work set from a JSON array file
pub async fn load_work_items(path: impl AsRef<Path>) -> Result<Vec<WorkItem>> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await?;
    let items: Vec<WorkItem> = serde_json::from_str(&raw)?;

    tracing::debug!(path = %path.display(), items = items.len(), "loaded work items");
    Ok(items)
}
