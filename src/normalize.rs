//! Document normalization: raw, inconsistently labeled records → canonical documents.
//!
//! Total over mappings. Every field degrades to `None`/empty on its own; nothing here
//! fails except the non-mapping case in [`normalize_value`].

use serde_json::Value;
use tracing::debug;

use crate::classify::{classify, TagCategory};
use crate::error::{NormalizeError, Result};
use crate::keys::canonicalize;
use crate::models::{
    is_consumed_label, Bpm, FieldLabels, NormalizedDocument, RawRecord, ScalarFields, TagBuckets,
    BPM_LABELS, CATEGORY_BLOCK_LABELS, ID_LABEL, INSTRUMENTS_USED_LABEL, LANGUAGE_LABELS,
    LYRICS_LABELS, TITLE_LABELS, TRACK_KEY_LABELS,
};

// ============================================================================
// VALUE HELPERS
// ============================================================================

/// A value counts as present unless it is null, false, zero, or the empty string.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a scalar as text. Arrays, objects and null have no text form.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Treat a value as a sequence of strings; a scalar becomes a one-element sequence.
/// Nested sequences are flattened, nulls and mappings dropped.
pub fn value_strings(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_strings(value, &mut out);
    out
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        other => out.extend(scalar_text(other)),
    }
}

// ============================================================================
// FIELD RESOLUTION
// ============================================================================

/// Walk the labels in priority order; first present value that passes `accept` wins.
fn resolve<T>(
    raw: &RawRecord,
    labels: &FieldLabels,
    accept: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    labels
        .labels
        .iter()
        .filter_map(|label| raw.get(*label).map(|value| (*label, value)))
        .filter(|(_, value)| is_present(value))
        .find_map(|(label, value)| {
            let resolved = accept(value)?;
            debug!(field = labels.field, label, "resolved field");
            Some(resolved)
        })
}

/// Resolve a text field (title, language, lyrics, track key).
pub fn resolve_text(raw: &RawRecord, labels: &FieldLabels) -> Option<String> {
    resolve(raw, labels, scalar_text)
}

/// Resolve BPM, keeping numbers numeric and strings verbatim.
pub fn resolve_bpm(raw: &RawRecord) -> Option<Bpm> {
    resolve(raw, &BPM_LABELS, |value| match value {
        Value::Number(n) => Some(Bpm::Number(n.clone())),
        Value::String(s) => Some(Bpm::Text(s.clone())),
        _ => None,
    })
}

pub fn resolve_scalars(raw: &RawRecord) -> ScalarFields {
    ScalarFields {
        title: resolve_text(raw, &TITLE_LABELS),
        language: resolve_text(raw, &LANGUAGE_LABELS),
        lyrics: resolve_text(raw, &LYRICS_LABELS),
        bpm: resolve_bpm(raw),
        track_key: resolve_text(raw, &TRACK_KEY_LABELS),
    }
}

/// The record's own id if it carries one, else the id assigned by the caller.
fn resolve_id(raw: &RawRecord, assigned_id: &str) -> String {
    raw.get(ID_LABEL)
        .filter(|value| is_present(value))
        .and_then(scalar_text)
        .unwrap_or_else(|| assigned_id.to_string())
}

// ============================================================================
// TAG EXTRACTION
// ============================================================================

/// First category-tag block that is present and is a mapping.
fn category_block(raw: &RawRecord) -> Option<&RawRecord> {
    CATEGORY_BLOCK_LABELS
        .iter()
        .filter_map(|label| raw.get(*label))
        .find(|value| is_present(value))
        .and_then(Value::as_object)
}

/// Fill the buckets from the category block, "Instruments Used", then stray top-level fields.
pub fn extract_tags(raw: &RawRecord) -> TagBuckets {
    let mut buckets = TagBuckets::default();

    if let Some(block) = category_block(raw) {
        for (key, value) in block {
            let category = classify(&canonicalize(key));
            debug!(key = %key, bucket = category.field_name(), "classified tag entry");
            buckets.push(category, value_strings(value));
        }
    }

    if let Some(value) = raw.get(INSTRUMENTS_USED_LABEL).filter(|v| is_present(v)) {
        buckets.push(TagCategory::Instruments, value_strings(value));
    }

    for (label, value) in raw {
        if is_consumed_label(label) {
            continue;
        }
        if matches!(value, Value::String(_) | Value::Array(_)) {
            buckets.push(TagCategory::Tags, value_strings(value));
        }
    }

    buckets
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Normalize one raw record into the canonical schema.
pub fn normalize(raw: &RawRecord, assigned_id: &str) -> NormalizedDocument {
    let id = resolve_id(raw, assigned_id);
    NormalizedDocument::new(id, resolve_scalars(raw), extract_tags(raw))
}

/// Normalize an arbitrary JSON value; anything but a mapping is `InvalidInput`.
pub fn normalize_value(raw: &Value, assigned_id: &str) -> Result<NormalizedDocument> {
    match raw {
        Value::Object(map) => Ok(normalize(map, assigned_id)),
        other => Err(NormalizeError::InvalidInput {
            id: assigned_id.to_string(),
            found: json_kind(other),
        }),
    }
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_title_fallback_priority() {
        let raw = record(json!({"Song Title": "Second", "title": "First"}));
        assert_eq!(normalize(&raw, "a_1").title.as_deref(), Some("First"));

        let raw = record(json!({"title": "", "Song Title": "Second"}));
        assert_eq!(normalize(&raw, "a_1").title.as_deref(), Some("Second"));
    }

    #[test]
    fn test_scalar_labels() {
        let raw = record(json!({
            "Language of song": "Hindi",
            "Full Lyrics In Song": "full",
            "Lyrics In Song": "partial",
            "Approximate BPM": "65-75 BPM",
            "track-song Key": "C minor",
        }));
        let doc = normalize(&raw, "a_1");
        assert_eq!(doc.language.as_deref(), Some("Hindi"));
        assert_eq!(doc.lyrics.as_deref(), Some("partial"));
        assert_eq!(doc.bpm, Some(Bpm::Text("65-75 BPM".to_string())));
        assert_eq!(doc.track_key.as_deref(), Some("C minor"));
    }

    #[test]
    fn test_missing_fields_default() {
        let doc = normalize(&RawRecord::new(), "empty_1");
        assert_eq!(doc.id, "empty_1");
        assert!(doc.title.is_none());
        assert!(doc.language.is_none());
        assert!(doc.lyrics.is_none());
        assert!(doc.bpm.is_none());
        assert!(doc.track_key.is_none());
        assert!(doc.instruments.is_empty());
        assert!(doc.tags.is_empty());
        assert!(doc.suggest.input.is_empty());
        assert_eq!(doc.suggest.weight, 1);
    }

    #[test]
    fn test_numeric_bpm_and_zero() {
        let raw = record(json!({"bpm": 0, "BPM": 92}));
        assert_eq!(normalize(&raw, "a_1").bpm, Some(Bpm::Number(92u64.into())));

        let raw = record(json!({"bpm": ["not", "scalar"], "BPM": "80"}));
        assert_eq!(normalize(&raw, "a_1").bpm, Some(Bpm::Text("80".to_string())));
    }

    #[test]
    fn test_own_id_wins() {
        let raw = record(json!({"id": "track-42", "title": "X"}));
        assert_eq!(normalize(&raw, "batch_1").id, "track-42");

        let raw = record(json!({"id": 7}));
        assert_eq!(normalize(&raw, "batch_1").id, "7");

        let raw = record(json!({"id": ""}));
        assert_eq!(normalize(&raw, "batch_1").id, "batch_1");
    }

    #[test]
    fn test_category_block_classification() {
        let raw = record(json!({
            "Category wise tags": {
                "Instrument Tags": ["sitar", "tabla"],
                "Genre/Sub-genre": "Classical",
                "Overall Mood": ["calm"],
                "Vibe": "serene",
                "Themes": ["rain", "longing"],
                "Era": "1970s"
            }
        }));
        let doc = normalize(&raw, "a_1");
        assert_eq!(doc.instruments, vec!["sitar", "tabla"]);
        assert_eq!(doc.genre_subgenre, vec!["Classical"]);
        assert_eq!(doc.mood_vibe, vec!["calm", "serene"]);
        assert_eq!(doc.themes, vec!["rain", "longing"]);
        assert_eq!(doc.tags, vec!["1970s"]);
    }

    #[test]
    fn test_lowercase_block_label() {
        let raw = record(json!({"category wise tags": {"mood": "dreamy"}}));
        assert_eq!(normalize(&raw, "a_1").mood_vibe, vec!["dreamy"]);

        let raw = record(json!({
            "Category wise tags": {"mood": "first"},
            "category wise tags": {"mood": "second"}
        }));
        assert_eq!(normalize(&raw, "a_1").mood_vibe, vec!["first"]);
    }

    #[test]
    fn test_dedup_across_sources() {
        let raw = record(json!({
            "Category wise tags": {"Instruments": ["sitar", "tabla"]},
            "Instruments Used": ["sitar", "flute", "tabla"]
        }));
        let doc = normalize(&raw, "a_1");
        assert_eq!(doc.instruments, vec!["sitar", "tabla", "flute"]);
    }

    #[test]
    fn test_dedup_is_case_sensitive() {
        let raw = record(json!({"Instruments Used": ["Sitar", "sitar", "Sitar"]}));
        assert_eq!(normalize(&raw, "a_1").instruments, vec!["Sitar", "sitar"]);
    }

    #[test]
    fn test_instruments_used_scalar() {
        let raw = record(json!({"Instruments Used": "harmonium"}));
        let doc = normalize(&raw, "a_1");
        assert_eq!(doc.instruments, vec!["harmonium"]);
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn test_stray_fields_become_tags() {
        let raw = record(json!({
            "title": "Rainfall",
            "Era": "1970s",
            "Occasion": ["wedding", "festival"],
            "Duration": 245,
            "Meta": {"source": "x"},
            "Explicit": false,
            "Lyrics": "words",
            "BPM": "90",
            "key": "D"
        }));
        let doc = normalize(&raw, "a_1");
        assert_eq!(doc.tags, vec!["1970s", "wedding", "festival"]);
    }

    #[test]
    fn test_block_tags_precede_stray_tags() {
        let raw = record(json!({
            "Era": "1970s",
            "Category wise tags": {"Setting": ["night", "1970s"]}
        }));
        assert_eq!(normalize(&raw, "a_1").tags, vec!["night", "1970s"]);
    }

    #[test]
    fn test_non_mapping_block_ignored() {
        let raw = record(json!({"Category wise tags": "oops"}));
        let doc = normalize(&raw, "a_1");
        assert!(doc.tags.is_empty());
        assert!(doc.instruments.is_empty());
    }

    #[test]
    fn test_suggest_composition() {
        let raw = record(json!({"title": "Rainfall", "Instruments Used": ["sitar"]}));
        let doc = normalize(&raw, "a_1");
        assert_eq!(doc.suggest.input, vec!["Rainfall", "sitar"]);
        assert_eq!(doc.suggest.weight, 1);
    }

    #[test]
    fn test_suggest_bucket_order() {
        let raw = record(json!({
            "Song Title": "Dusk",
            "Category wise tags": {
                "Themes": "loss",
                "Mood": "somber",
                "Genre": "ghazal",
                "Instrument": "sarangi",
                "Other": "skip-me"
            }
        }));
        let doc = normalize(&raw, "a_1");
        assert_eq!(doc.suggest.input, vec!["Dusk", "sarangi", "ghazal", "somber", "loss"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = record(json!({
            "Song Title": "Rainfall",
            "Category wise tags": {"Instrument Tags": ["sitar", "tabla", "sitar"]},
            "Era": "1970s"
        }));
        let first = serde_json::to_string(&normalize(&raw, "a_1")).unwrap();
        let second = serde_json::to_string(&normalize(&raw, "a_1")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_value_rejects_non_mapping() {
        let err = normalize_value(&json!(["not", "a", "record"]), "b_2").unwrap_err();
        assert_eq!(
            err,
            NormalizeError::InvalidInput {
                id: "b_2".to_string(),
                found: "array"
            }
        );
        assert!(normalize_value(&json!("text"), "b_3").is_err());
        assert!(normalize_value(&json!({"title": "ok"}), "b_4").is_ok());
    }

    #[test]
    fn test_serialized_shape() {
        let raw = record(json!({"title": "Rainfall", "BPM": 72}));
        let value = serde_json::to_value(normalize(&raw, "a_1")).unwrap();
        assert_eq!(value["id"], "a_1");
        assert_eq!(value["bpm"], 72);
        assert_eq!(value["language"], Value::Null);
        assert_eq!(value["suggest"], json!({"input": ["Rainfall"], "weight": 1}));
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "id", "title", "language", "lyrics", "bpm", "track_key", "instruments",
                "genre_subgenre", "mood_vibe", "themes", "tags", "suggest"
            ]
        );
    }
}
