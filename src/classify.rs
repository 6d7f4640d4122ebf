//! Tag classification for category-tag entries.
//!
//! Rules are evaluated top to bottom against the canonical key; first substring hit wins,
//! anything unmatched lands in the generic `tags` bucket.

/// The five buckets a descriptive value can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagCategory {
    Instruments,
    GenreSubgenre,
    MoodVibe,
    Themes,
    Tags,
}

impl TagCategory {
    /// Field name in the normalized document.
    pub fn field_name(self) -> &'static str {
        match self {
            TagCategory::Instruments => "instruments",
            TagCategory::GenreSubgenre => "genre_subgenre",
            TagCategory::MoodVibe => "mood_vibe",
            TagCategory::Themes => "themes",
            TagCategory::Tags => "tags",
        }
    }
}

/// Ordered (substrings, bucket) rules. Order is priority.
pub const CLASSIFICATION_RULES: &[(&[&str], TagCategory)] = &[
    (&["instrument"], TagCategory::Instruments),
    (&["genre"], TagCategory::GenreSubgenre),
    (&["mood", "vibe"], TagCategory::MoodVibe),
    (&["theme"], TagCategory::Themes),
];

/// Classify a canonical key (see [`crate::keys::canonicalize`]).
pub fn classify(canonical_key: &str) -> TagCategory {
    CLASSIFICATION_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| canonical_key.contains(n)))
        .map(|&(_, category)| category)
        .unwrap_or(TagCategory::Tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::canonicalize;

    #[test]
    fn test_classify_each_bucket() {
        assert_eq!(classify("instrument_tags"), TagCategory::Instruments);
        assert_eq!(classify("sub_genre"), TagCategory::GenreSubgenre);
        assert_eq!(classify("overall_mood"), TagCategory::MoodVibe);
        assert_eq!(classify("vibe"), TagCategory::MoodVibe);
        assert_eq!(classify("lyrical_themes"), TagCategory::Themes);
        assert_eq!(classify("era"), TagCategory::Tags);
    }

    #[test]
    fn test_classify_priority() {
        // "instrument" outranks everything after it
        assert_eq!(classify("instrument_genre_mood"), TagCategory::Instruments);
        assert_eq!(classify("genre_and_mood"), TagCategory::GenreSubgenre);
        assert_eq!(classify("vibe_theme"), TagCategory::MoodVibe);
    }

    #[test]
    fn test_classify_after_canonicalize() {
        for label in ["Instrument Tags", "INSTRUMENT-TAGS", "instrument tags!!"] {
            assert_eq!(classify(&canonicalize(label)), TagCategory::Instruments);
        }
        assert_eq!(classify(&canonicalize("Overall Mood")), TagCategory::MoodVibe);
        // Classification is case-sensitive on the canonical (lowercased) key only
        assert_eq!(classify("Overall_Mood"), TagCategory::Tags);
    }

    #[test]
    fn test_field_names() {
        assert_eq!(TagCategory::GenreSubgenre.field_name(), "genre_subgenre");
        assert_eq!(TagCategory::MoodVibe.field_name(), "mood_vibe");
    }
}
