//! Error types for the normalization core.
//!
//! Normalization is total over mappings; these are the only conditions a caller sees.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Raw record is not a mapping (array, string, number, ...).
    /// The batch loader skips or reports the one record and keeps going.
    #[error("invalid input for '{id}': expected a mapping, got {found}")]
    InvalidInput { id: String, found: &'static str },

    /// A batch with zero raw records was handed to the normalizer.
    #[error("batch '{0}' contains no records")]
    EmptyBatch(String),
}

pub type Result<T> = std::result::Result<T, NormalizeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = NormalizeError::InvalidInput {
            id: "songs_3".to_string(),
            found: "array",
        };
        assert_eq!(
            err.to_string(),
            "invalid input for 'songs_3': expected a mapping, got array"
        );
        assert_eq!(
            NormalizeError::EmptyBatch("songs".to_string()).to_string(),
            "batch 'songs' contains no records"
        );
    }
}
