//! "Showing X of N" status indicator parsing

use harvest_core::{HarvestError, Result};
use regex::Regex;
use std::sync::OnceLock;

fn status_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)showing\s+[\d,]+\s+of\s+([\d,]+)").expect("status pattern is valid")
    })
}

/// Extract N from text like "Showing 20 of 1,250 products"
pub fn parse_total_count(text: &str) -> Result<usize> {
    let captures = status_pattern().captures(text).ok_or_else(|| {
        HarvestError::TargetCountUnavailable(format!("no 'Showing X of N' in '{}'", text.trim()))
    })?;

    let digits: String = captures[1].chars().filter(|c| *c != ',').collect();
    digits.parse().map_err(|e| {
        HarvestError::TargetCountUnavailable(format!("unparseable total '{}': {}", &captures[1], e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_total() {
        assert_eq!(parse_total_count("Showing 20 of 150 products").unwrap(), 150);
        assert_eq!(parse_total_count("showing 0 of 3 items").unwrap(), 3);
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(parse_total_count("Showing 50 of 1,250 products").unwrap(), 1250);
    }

    #[test]
    fn test_surrounding_text() {
        assert_eq!(
            parse_total_count("Inventory\n  Showing 10 of 42 products  \nNext").unwrap(),
            42
        );
    }

    #[test]
    fn test_missing_pattern() {
        assert!(matches!(
            parse_total_count("Loading..."),
            Err(HarvestError::TargetCountUnavailable(_))
        ));
    }

    #[test]
    fn test_overflow_is_unavailable() {
        let text = format!("Showing 1 of {}0 products", usize::MAX);
        assert!(matches!(
            parse_total_count(&text),
            Err(HarvestError::TargetCountUnavailable(_))
        ));
    }
}
