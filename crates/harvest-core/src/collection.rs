//! Order-preserving, duplicate-free accumulation of rows

use crate::types::{Row, RowIdentity};
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// The accumulating result set
///
/// Rows keep discovery order and are unique by [`RowIdentity`]. The only
/// mutation is [`Collection::insert`], so a collection never shrinks.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    rows: Vec<Row>,
    seen: HashSet<RowIdentity>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `row` unless a row with the same identity is already present.
    /// Returns whether the row was added.
    pub fn insert(&mut self, row: Row) -> bool {
        if !self.seen.insert(row.identity()) {
            return false;
        }
        self.rows.push(row);
        true
    }

    pub fn contains(&self, row: &Row) -> bool {
        self.seen.contains(&row.identity())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, price: &str) -> Row {
        Row::new().with("Name", Some(name)).with("Price", Some(price))
    }

    #[test]
    fn test_insert_rejects_duplicate_identity() {
        let mut collection = Collection::new();
        assert!(collection.insert(row("Lamp", "10")));
        assert!(!collection.insert(row("Lamp", "10")));
        assert!(collection.insert(row("Lamp", "11")));
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_preserves_first_seen_order() {
        let mut collection = Collection::new();
        for name in ["c", "a", "b", "a", "c"] {
            collection.insert(row(name, "1"));
        }
        let names: Vec<_> = collection
            .rows()
            .iter()
            .map(|r| r.get("Name").flatten().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_contains_uses_identity() {
        let mut collection = Collection::new();
        collection.insert(row("Lamp", "10"));
        assert!(collection.contains(&row("Lamp", "10")));
        assert!(!collection.contains(&row("Desk", "10")));
    }

    #[test]
    fn test_field_identical_rows_collapse() {
        // Distinct products that happen to share every visible value are
        // indistinguishable to the identity scheme.
        let mut collection = Collection::new();
        collection.insert(row("Widget", "5"));
        collection.insert(row("Widget", "5"));
        assert_eq!(collection.len(), 1);
    }
}
