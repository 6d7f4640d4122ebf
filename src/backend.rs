//! Search backend contract and the thin callers around it.
//!
//! The backend itself (index storage, ranking, aggregation) lives elsewhere. Callers
//! hand a `SearchBackend` in; nothing here holds a global client.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::models::NormalizedDocument;
use crate::paging::Pagination;
use crate::query::{compile, CompiledQuery, SearchParameters};

/// Per-item failure reported by a bulk write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkItemError {
    pub id: String,
    pub reason: String,
}

/// Outcome of a bulk write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub indexed: usize,
    pub error_count: usize,
    pub item_errors: Vec<BulkItemError>,
}

/// Raw result set from the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResponse {
    pub total_hits: u64,
    pub hits: Vec<Value>,
    pub aggregations: Value,
}

/// Trait for full-text/faceted search backends.
pub trait SearchBackend: Send + Sync {
    /// Store documents under their ids, replacing existing ones.
    fn bulk_index(&self, index: &str, docs: &[NormalizedDocument]) -> Result<BulkReport>;

    /// Run a compiled query over a window of `size` hits starting at `from`.
    fn search(
        &self,
        index: &str,
        query: &CompiledQuery,
        from: u64,
        size: u64,
    ) -> Result<SearchResponse>;

    /// Fetch one stored document.
    fn get_by_id(&self, index: &str, id: &str) -> Result<Option<Value>>;
}

// =========================================================================
// Batch loading
// =========================================================================

/// Write normalized documents to the backend and log the outcome.
pub fn index_documents(
    backend: &dyn SearchBackend,
    index: &str,
    docs: &[NormalizedDocument],
) -> Result<BulkReport> {
    if docs.is_empty() {
        return Ok(BulkReport::default());
    }
    let report = backend
        .bulk_index(index, docs)
        .with_context(|| format!("Bulk index of {} documents into '{}' failed", docs.len(), index))?;
    if report.error_count > 0 {
        warn!(
            index,
            errors = report.error_count,
            "bulk index finished with item errors"
        );
        for item in &report.item_errors {
            warn!(index, id = %item.id, "{}", item.reason);
        }
    } else {
        info!(index, indexed = report.indexed, "bulk index complete");
    }
    Ok(report)
}

/// One `_bulk` action line plus the document line per document, newline terminated.
pub fn bulk_ndjson(index: &str, docs: &[NormalizedDocument]) -> Result<String> {
    let mut body = String::new();
    for doc in docs {
        let action = serde_json::json!({"index": {"_index": index, "_id": doc.id}});
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(doc)?);
        body.push('\n');
    }
    Ok(body)
}

// =========================================================================
// Request handling
// =========================================================================

/// One page of search results, as handed to rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub q: String,
    pub page: u64,
    pub size: u64,
    pub total: u64,
    pub results: Vec<Value>,
    pub aggs: Value,
}

/// Compile the parameters, apply the pagination window and run the search.
pub fn search_catalog(
    backend: &dyn SearchBackend,
    index: &str,
    params: &SearchParameters,
) -> Result<SearchPage> {
    let query = compile(params);
    let window: Pagination = params.pagination();

    let response = backend
        .search(index, &query, window.from(), window.size)
        .with_context(|| format!("Search against '{}' failed", index))?;

    Ok(SearchPage {
        q: params.q.clone().unwrap_or_default(),
        page: window.page,
        size: window.size,
        total: response.total_hits,
        results: response.hits,
        aggs: response.aggregations,
    })
}

/// Single-document lookup; the compiled-query path is not involved.
pub fn fetch_document(backend: &dyn SearchBackend, index: &str, id: &str) -> Result<Option<Value>> {
    backend
        .get_by_id(index, id)
        .with_context(|| format!("Lookup of '{}' in '{}' failed", id, index))
}
