//! Pagination window applied by the caller when it sends a compiled query.

use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Leading integer, the way a lenient `parseInt` reads "2", " 3 ", "4abc".
static LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([+-]?\d+)").unwrap());

/// Parse the leading integer of `raw`, if any.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    LEADING_INT
        .captures(raw)
        .and_then(|caps| caps[1].parse::<i64>().ok())
}

/// Positive integer or `default`.
fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(parse_leading_int)
        .filter(|n| *n > 0)
        .map_or(default, |n| n as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u64,
    pub size: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Coerce raw request values; missing, non-numeric or non-positive input falls back
    /// to the defaults.
    pub fn from_params(page: Option<&str>, size: Option<&str>) -> Self {
        Self {
            page: positive_or(page, DEFAULT_PAGE),
            size: positive_or(size, DEFAULT_PAGE_SIZE),
        }
    }

    /// Offset of the first hit.
    pub fn from(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::from_params(None, None);
        assert_eq!(p, Pagination::default());
        assert_eq!(p.from(), 0);
        assert_eq!(p.size, 10);
    }

    #[test]
    fn test_explicit_window() {
        let p = Pagination::from_params(Some("2"), Some("5"));
        assert_eq!(p.from(), 5);
        assert_eq!(p.size, 5);

        let p = Pagination::from_params(Some("3"), None);
        assert_eq!(p.from(), 20);
    }

    #[test]
    fn test_invalid_values_clamp_to_default() {
        assert_eq!(Pagination::from_params(Some("0"), Some("-4")), Pagination::default());
        assert_eq!(Pagination::from_params(Some("abc"), Some("")), Pagination::default());
    }

    #[test]
    fn test_lenient_parse() {
        assert_eq!(parse_leading_int(" 4abc"), Some(4));
        assert_eq!(parse_leading_int("+7"), Some(7));
        assert_eq!(parse_leading_int("-2"), Some(-2));
        assert_eq!(parse_leading_int("x4"), None);
        assert_eq!(Pagination::from_params(Some("2.9"), Some("5")).page, 2);
    }
}
