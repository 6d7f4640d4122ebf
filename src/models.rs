//! Core data models for catalog normalization.
//!
//! This module contains the canonical document schema, the label tables used to
//! resolve scalar fields, and the ordered set that backs every tag bucket.

use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::classify::TagCategory;

/// A raw source record: arbitrary labels, arbitrary nesting.
pub type RawRecord = Map<String, Value>;

// ============================================================================
// Label Tables
// ============================================================================

/// Alternate source labels for one canonical field, in priority order.
#[derive(Debug, Clone, Copy)]
pub struct FieldLabels {
    pub field: &'static str,
    pub labels: &'static [&'static str],
}

pub const ID_LABEL: &str = "id";

pub const TITLE_LABELS: FieldLabels = FieldLabels {
    field: "title",
    labels: &["title", "Song Title"],
};

pub const LANGUAGE_LABELS: FieldLabels = FieldLabels {
    field: "language",
    labels: &["language", "Language of song"],
};

pub const LYRICS_LABELS: FieldLabels = FieldLabels {
    field: "lyrics",
    labels: &["lyrics", "Lyrics", "Lyrics In Song", "Full Lyrics In Song"],
};

pub const BPM_LABELS: FieldLabels = FieldLabels {
    field: "bpm",
    labels: &["bpm", "BPM", "Approximate BPM"],
};

pub const TRACK_KEY_LABELS: FieldLabels = FieldLabels {
    field: "track_key",
    labels: &["key", "Key", "track-song Key"],
};

/// Scalar label tables, in schema order.
pub const SCALAR_FIELDS: [FieldLabels; 5] = [
    TITLE_LABELS,
    LANGUAGE_LABELS,
    LYRICS_LABELS,
    BPM_LABELS,
    TRACK_KEY_LABELS,
];

/// Nested category-tag block, looked up in this order.
pub const CATEGORY_BLOCK_LABELS: &[&str] = &["Category wise tags", "category wise tags"];

/// Top-level instrument list that always feeds the instruments bucket.
pub const INSTRUMENTS_USED_LABEL: &str = "Instruments Used";

/// True if the label is consumed by field resolution and must not be captured as a stray tag.
pub fn is_consumed_label(label: &str) -> bool {
    label == ID_LABEL
        || label == INSTRUMENTS_USED_LABEL
        || CATEGORY_BLOCK_LABELS.contains(&label)
        || SCALAR_FIELDS.iter().any(|f| f.labels.contains(&label))
}

// ============================================================================
// Ordered Set
// ============================================================================

/// Append-only sequence of distinct strings in first-occurrence order.
/// Membership is tracked separately so duplicate checks don't scan the sequence.
#[derive(Debug, Clone, Default)]
pub struct OrderedSet {
    seen: FxHashSet<String>,
    values: Vec<String>,
}

impl OrderedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append if not already present. Returns true if the value was new.
    pub fn insert(&mut self, value: String) -> bool {
        if self.seen.contains(&value) {
            return false;
        }
        self.seen.insert(value.clone());
        self.values.push(value);
        true
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, values: I) {
        for value in values {
            self.insert(value);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.values
    }
}

// ============================================================================
// Normalized Document
// ============================================================================

/// BPM as it appeared in the source: a number, or free text such as "65-75 BPM".
/// Text ranges are kept verbatim, never parsed into bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Bpm {
    Number(Number),
    Text(String),
}

/// Autocomplete payload derived from the title and the classified buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggest {
    pub input: Vec<String>,
    pub weight: u32,
}

/// Fixed relevance weight for every suggestion payload.
pub const SUGGEST_WEIGHT: u32 = 1;

impl Suggest {
    /// Title first, then instruments, genre_subgenre, mood_vibe, themes; empty entries dropped.
    pub fn derive(
        title: Option<&str>,
        instruments: &[String],
        genre_subgenre: &[String],
        mood_vibe: &[String],
        themes: &[String],
    ) -> Self {
        let input = title
            .into_iter()
            .chain(
                instruments
                    .iter()
                    .chain(genre_subgenre)
                    .chain(mood_vibe)
                    .chain(themes)
                    .map(String::as_str),
            )
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            input,
            weight: SUGGEST_WEIGHT,
        }
    }
}

/// Canonical, search-ready track document.
///
/// Produced once per raw record and never mutated afterwards. `suggest` is derived
/// from the other fields; use [`NormalizedDocument::new`] so it stays consistent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDocument {
    pub id: String,
    pub title: Option<String>,
    pub language: Option<String>,
    pub lyrics: Option<String>,
    pub bpm: Option<Bpm>,
    pub track_key: Option<String>,
    pub instruments: Vec<String>,
    pub genre_subgenre: Vec<String>,
    pub mood_vibe: Vec<String>,
    pub themes: Vec<String>,
    pub tags: Vec<String>,
    pub suggest: Suggest,
}

/// Resolved scalar fields of a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarFields {
    pub title: Option<String>,
    pub language: Option<String>,
    pub lyrics: Option<String>,
    pub bpm: Option<Bpm>,
    pub track_key: Option<String>,
}

/// The five classified tag buckets, deduplicated as they are filled.
#[derive(Debug, Clone, Default)]
pub struct TagBuckets {
    pub instruments: OrderedSet,
    pub genre_subgenre: OrderedSet,
    pub mood_vibe: OrderedSet,
    pub themes: OrderedSet,
    pub tags: OrderedSet,
}

impl TagBuckets {
    pub fn bucket_mut(&mut self, category: TagCategory) -> &mut OrderedSet {
        match category {
            TagCategory::Instruments => &mut self.instruments,
            TagCategory::GenreSubgenre => &mut self.genre_subgenre,
            TagCategory::MoodVibe => &mut self.mood_vibe,
            TagCategory::Themes => &mut self.themes,
            TagCategory::Tags => &mut self.tags,
        }
    }

    /// Append values to the bucket for `category`, skipping duplicates.
    pub fn push(&mut self, category: TagCategory, values: Vec<String>) {
        self.bucket_mut(category).extend(values);
    }
}

impl NormalizedDocument {
    pub fn new(id: String, scalars: ScalarFields, buckets: TagBuckets) -> Self {
        let instruments = buckets.instruments.into_vec();
        let genre_subgenre = buckets.genre_subgenre.into_vec();
        let mood_vibe = buckets.mood_vibe.into_vec();
        let themes = buckets.themes.into_vec();
        let suggest = Suggest::derive(
            scalars.title.as_deref(),
            &instruments,
            &genre_subgenre,
            &mood_vibe,
            &themes,
        );
        Self {
            id,
            title: scalars.title,
            language: scalars.language,
            lyrics: scalars.lyrics,
            bpm: scalars.bpm,
            track_key: scalars.track_key,
            instruments,
            genre_subgenre,
            mood_vibe,
            themes,
            tags: buckets.tags.into_vec(),
            suggest,
        }
    }
}
