//! Safety utilities to prevent overwriting raw source data.
//!
//! The normalizer writes one output file per raw file, with the same name.
//! Pointing the output at the raw directory would replace the sources.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

fn resolved(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Validates that an output directory is safe to write normalized files into.
///
/// Checks:
/// - Output cannot be the same directory as the raw source directory
/// - Output cannot be an existing regular file
///
/// # Returns
/// * `Ok(())` if the output directory is safe
/// * `Err` with a descriptive message if the check fails
pub fn validate_output_dir(output: &Path, source: &Path) -> Result<()> {
    if resolved(output) == resolved(source) {
        bail!(
            "Safety check failed: output '{}' cannot be the same as source '{}'",
            output.display(),
            source.display()
        );
    }

    if output.is_file() {
        bail!(
            "Safety check failed: output '{}' is a file, expected a directory",
            output.display()
        );
    }

    Ok(())
}

/// Validates the bulk NDJSON file path: must end in `.ndjson` and must not live in
/// the source directory.
pub fn validate_bulk_path(output: &Path, source: &Path) -> Result<()> {
    let is_ndjson = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ndjson"));
    if !is_ndjson {
        bail!(
            "Safety check failed: bulk file '{}' must have an .ndjson extension",
            output.display()
        );
    }

    if let Some(parent) = output.parent() {
        if resolved(parent) == resolved(source) {
            bail!(
                "Safety check failed: bulk file '{}' cannot be written into source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_output_dir() {
        let output = PathBuf::from("/tmp/tunefacet-out/normalized");
        let source = PathBuf::from("/tmp/tunefacet-out/raw");
        assert!(validate_output_dir(&output, &source).is_ok());
    }

    #[test]
    fn test_output_equals_source() {
        let path = PathBuf::from("/data/raw");
        let result = validate_output_dir(&path, &path);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as source"));
    }

    #[test]
    fn test_output_equals_source_after_resolution() {
        let dir = std::env::temp_dir();
        let dotted = dir.join(".");
        assert!(validate_output_dir(&dotted, &dir).is_err());
    }

    #[test]
    fn test_bulk_path_extension() {
        let source = PathBuf::from("/data/raw");
        assert!(validate_bulk_path(Path::new("/data/out/bulk.ndjson"), &source).is_ok());
        let result = validate_bulk_path(Path::new("/data/out/bulk.json"), &source);
        assert!(result.unwrap_err().to_string().contains(".ndjson"));
    }

    #[test]
    fn test_bulk_path_in_source_blocked() {
        let source = PathBuf::from("/data/raw");
        assert!(validate_bulk_path(Path::new("/data/raw/bulk.ndjson"), &source).is_err());
    }
}
