//! Query compilation: user search parameters → backend query body.
//!
//! The compiled body carries a scored full-text clause (when there is free text),
//! exact-match and range filters, a highlight directive and facet aggregations.
//! Pagination stays outside the body; see [`crate::paging`].

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::paging::Pagination;

// ============================================================================
// FIELD TABLES
// ============================================================================

/// Full-text fields and their boosts.
pub const SCORED_FIELDS: &[(&str, u32)] = &[
    ("title", 4),
    ("lyrics", 3),
    ("genre_subgenre", 2),
    ("mood_vibe", 2),
    ("instruments", 2),
];

/// Aggregation name → document field, computed on the exact-match variant.
pub const FACET_AGGREGATIONS: &[(&str, &str)] = &[
    ("languages", "language"),
    ("instruments", "instruments"),
    ("mood_vibe", "mood_vibe"),
    ("themes", "themes"),
];

pub const HIGHLIGHT_FIELDS: &[&str] = &["title", "lyrics"];
pub const HIGHLIGHT_PRE_TAG: &str = "<mark>";
pub const HIGHLIGHT_POST_TAG: &str = "</mark>";

pub const BPM_FIELD: &str = "bpm";
pub const TRACK_KEY_FIELD: &str = "track_key";

/// Untokenized variant of a text field.
pub fn keyword_field(field: &str) -> String {
    format!("{}.keyword", field)
}

// ============================================================================
// SEARCH PARAMETERS
// ============================================================================

/// A facet filter value: one value or a set (match any).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FacetValues {
    One(String),
    Many(Vec<String>),
}

impl FacetValues {
    /// Non-empty values, in the order given.
    pub fn values(&self) -> Vec<String> {
        let all: Vec<&String> = match self {
            FacetValues::One(v) => vec![v],
            FacetValues::Many(vs) => vs.iter().collect(),
        };
        all.into_iter()
            .filter(|v| !v.is_empty())
            .cloned()
            .collect()
    }

    fn push(&mut self, value: String) {
        match self {
            FacetValues::One(first) => {
                let first = std::mem::take(first);
                *self = FacetValues::Many(vec![first, value]);
            }
            FacetValues::Many(vs) => vs.push(value),
        }
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accept a string or a number; anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(value.and_then(scalar_text))
}

/// Accept one string/number or an array of them. Other elements are dropped;
/// anything else, or an array with nothing usable, reads as absent.
fn lenient_facet<'de, D>(deserializer: D) -> Result<Option<FacetValues>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => {
            let values: Vec<String> = items.into_iter().filter_map(scalar_text).collect();
            (!values.is_empty()).then_some(FacetValues::Many(values))
        }
        Some(other) => scalar_text(other).map(FacetValues::One),
        None => None,
    })
}

/// User-supplied search parameters. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParameters {
    #[serde(default, deserialize_with = "lenient_string")]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "lenient_facet")]
    pub language: Option<FacetValues>,
    #[serde(default, deserialize_with = "lenient_facet")]
    pub instruments: Option<FacetValues>,
    #[serde(default, deserialize_with = "lenient_facet")]
    pub mood: Option<FacetValues>,
    #[serde(default, deserialize_with = "lenient_facet")]
    pub themes: Option<FacetValues>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bpm_min: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bpm_max: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub page: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub size: Option<String>,
}

impl SearchParameters {
    /// Build from query-string style pairs. Repeated facet keys accumulate into a set;
    /// for scalar keys the first occurrence wins. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value = value.into();
            let facet = match key.as_ref() {
                "language" => &mut params.language,
                "instruments" => &mut params.instruments,
                "mood" => &mut params.mood,
                "themes" => &mut params.themes,
                scalar => {
                    let slot = match scalar {
                        "q" => &mut params.q,
                        "bpm_min" => &mut params.bpm_min,
                        "bpm_max" => &mut params.bpm_max,
                        "key" => &mut params.key,
                        "page" => &mut params.page,
                        "size" => &mut params.size,
                        _ => continue,
                    };
                    slot.get_or_insert(value);
                    continue;
                }
            };
            *facet = Some(match facet.take() {
                Some(mut existing) => {
                    existing.push(value);
                    existing
                }
                None => FacetValues::One(value),
            });
        }
        params
    }

    /// Offset/limit window for this request.
    pub fn pagination(&self) -> Pagination {
        Pagination::from_params(self.page.as_deref(), self.size.as_deref())
    }
}

/// Read a numeric bound permissively. Non-numeric, empty and non-finite input is absent.
pub fn parse_bound(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(Number::from(n));
    }
    let f = trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(Number::from(f as i64))
    } else {
        Number::from_f64(f)
    }
}

// ============================================================================
// COMPILED QUERY
// ============================================================================

/// Best-fields multi-field match with automatic fuzziness.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiMatch {
    pub query: String,
    pub fields: Vec<String>,
    #[serde(rename = "type")]
    pub match_type: String,
    pub fuzziness: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoredClause {
    MultiMatch(MultiMatch),
}

/// Non-scoring filter clause.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Exact match against any of `values`.
    Terms { field: String, values: Vec<String> },
    /// Exact match against one value.
    Term { field: String, value: String },
    /// Inclusive bounds; a missing bound is open on that side.
    Range {
        field: String,
        gte: Option<Number>,
        lte: Option<Number>,
    },
}

#[derive(Serialize)]
struct RangeBounds<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    gte: Option<&'a Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lte: Option<&'a Number>,
}

/// `{ key: value }`
struct Single<'a, T: Serialize>(&'a str, T);

impl<T: Serialize> Serialize for Single<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0, &self.1)?;
        map.end()
    }
}

impl Serialize for FilterClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterClause::Terms { field, values } => {
                Single("terms", Single(field, values)).serialize(serializer)
            }
            FilterClause::Term { field, value } => {
                Single("term", Single(field, value)).serialize(serializer)
            }
            FilterClause::Range { field, gte, lte } => {
                let bounds = RangeBounds {
                    gte: gte.as_ref(),
                    lte: lte.as_ref(),
                };
                Single("range", Single(field, bounds)).serialize(serializer)
            }
        }
    }
}

/// Highlight directive: matched fragments wrapped in the marker pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub pre_tags: Vec<String>,
    pub post_tags: Vec<String>,
    #[serde(serialize_with = "highlight_fields")]
    pub fields: Vec<String>,
}

fn highlight_fields<S: Serializer>(fields: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for field in fields {
        map.serialize_entry(field, &serde_json::Map::new())?;
    }
    map.end()
}

impl Default for Highlight {
    fn default() -> Self {
        Self {
            pre_tags: vec![HIGHLIGHT_PRE_TAG.to_string()],
            post_tags: vec![HIGHLIGHT_POST_TAG.to_string()],
            fields: HIGHLIGHT_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Top-value counts for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub name: String,
    pub field: String,
}

/// Structured query ready for the search backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub must: Vec<ScoredClause>,
    pub filter: Vec<FilterClause>,
    pub highlight: Highlight,
    pub aggs: Vec<Aggregation>,
}

impl CompiledQuery {
    /// No scored clause and no filters: the backend matches everything.
    pub fn is_match_all(&self) -> bool {
        self.must.is_empty() && self.filter.is_empty()
    }
}

#[derive(Serialize)]
struct BoolQuery<'a> {
    must: &'a [ScoredClause],
    filter: &'a [FilterClause],
}

struct Aggregations<'a>(&'a [Aggregation]);

impl Serialize for Aggregations<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for agg in self.0 {
            map.serialize_entry(&agg.name, &Single("terms", Single("field", &agg.field)))?;
        }
        map.end()
    }
}

impl Serialize for CompiledQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bool_query = BoolQuery {
            must: &self.must,
            filter: &self.filter,
        };
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("query", &Single("bool", bool_query))?;
        map.serialize_entry("highlight", &self.highlight)?;
        map.serialize_entry("aggs", &Aggregations(&self.aggs))?;
        map.end()
    }
}

// ============================================================================
// COMPILATION
// ============================================================================

fn full_text_clause(q: &str) -> ScoredClause {
    ScoredClause::MultiMatch(MultiMatch {
        query: q.to_string(),
        fields: SCORED_FIELDS
            .iter()
            .map(|(field, boost)| format!("{}^{}", field, boost))
            .collect(),
        match_type: "best_fields".to_string(),
        fuzziness: "AUTO".to_string(),
    })
}

fn facet_filter(values: Option<&FacetValues>, field: &str) -> Option<FilterClause> {
    let values = values?.values();
    if values.is_empty() {
        return None;
    }
    Some(FilterClause::Terms {
        field: keyword_field(field),
        values,
    })
}

fn bpm_filter(min: Option<&str>, max: Option<&str>) -> Option<FilterClause> {
    let gte = min.and_then(parse_bound);
    let lte = max.and_then(parse_bound);
    if gte.is_none() && lte.is_none() {
        return None;
    }
    Some(FilterClause::Range {
        field: BPM_FIELD.to_string(),
        gte,
        lte,
    })
}

/// Compile search parameters into a backend query. Never fails; anything absent or
/// unusable is left out of the body.
pub fn compile(params: &SearchParameters) -> CompiledQuery {
    let must = params
        .q
        .as_deref()
        .filter(|q| !q.trim().is_empty())
        .map(full_text_clause)
        .into_iter()
        .collect();

    let facets = [
        (params.language.as_ref(), "language"),
        (params.instruments.as_ref(), "instruments"),
        (params.mood.as_ref(), "mood_vibe"),
        (params.themes.as_ref(), "themes"),
    ];
    let mut filter: Vec<FilterClause> = facets
        .into_iter()
        .filter_map(|(values, field)| facet_filter(values, field))
        .collect();

    filter.extend(bpm_filter(
        params.bpm_min.as_deref(),
        params.bpm_max.as_deref(),
    ));

    if let Some(key) = params.key.as_deref().filter(|k| !k.is_empty()) {
        filter.push(FilterClause::Term {
            field: TRACK_KEY_FIELD.to_string(),
            value: key.to_string(),
        });
    }

    let aggs = FACET_AGGREGATIONS
        .iter()
        .map(|(name, field)| Aggregation {
            name: name.to_string(),
            field: keyword_field(field),
        })
        .collect();

    CompiledQuery {
        must,
        filter,
        highlight: Highlight::default(),
        aggs,
    }
}

// ============================================================================
// TESTS
// ============================================================================
