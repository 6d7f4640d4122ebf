//! Batch normalization.
//!
//! One raw file is one batch. Records without their own id get
//! `"<batch>_<1-based position>"`; ids depend only on position, so the parallel map
//! below produces the same output as a sequential one.

use rayon::prelude::*;
use serde_json::Value;
use tracing::warn;

use crate::error::{NormalizeError, Result};
use crate::models::NormalizedDocument;
use crate::normalize::normalize_value;

/// Identifier assigned to the record at `position` (1-based) of a batch.
pub fn batch_id(batch_name: &str, position: usize) -> String {
    format!("{}_{}", batch_name, position)
}

/// Outcome for one record of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub assigned_id: String,
    pub result: Result<NormalizedDocument>,
}

/// Split the content of one raw file into records: an array is a batch,
/// anything else is a batch of one.
pub fn records_from_json(content: Value) -> Vec<Value> {
    match content {
        Value::Array(records) => records,
        single => vec![single],
    }
}

/// Normalize every record of a batch, in input order.
///
/// An empty batch is an error. A record that is not a mapping is reported in its own
/// `BatchItem` and does not affect the others.
pub fn normalize_batch(batch_name: &str, records: &[Value]) -> Result<Vec<BatchItem>> {
    if records.is_empty() {
        return Err(NormalizeError::EmptyBatch(batch_name.to_string()));
    }

    let items: Vec<BatchItem> = records
        .par_iter()
        .enumerate()
        .map(|(idx, raw)| {
            let assigned_id = batch_id(batch_name, idx + 1);
            let result = normalize_value(raw, &assigned_id);
            BatchItem {
                assigned_id,
                result,
            }
        })
        .collect();

    for item in &items {
        if let Err(err) = &item.result {
            warn!(batch = batch_name, "skipping record: {}", err);
        }
    }

    Ok(items)
}

/// Documents of a batch, with invalid records dropped.
pub fn documents(items: Vec<BatchItem>) -> Vec<NormalizedDocument> {
    items.into_iter().filter_map(|item| item.result.ok()).collect()
}
