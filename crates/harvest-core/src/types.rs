//! Core type definitions for extracted table data

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::debug;

/// One extracted record, keyed by column header
///
/// Fields keep header order. A value is `None` when the cell had nothing to
/// offer for that column (a rating cell without its labelled sub-element).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, Option<String>)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field append, mostly for tests and fixtures
    pub fn with(mut self, column: impl Into<String>, value: Option<&str>) -> Self {
        self.push(column, value.map(str::to_string));
        self
    }

    /// Append a field. A repeated column name overwrites the earlier value in
    /// place, so the mapping never holds two entries for one key.
    pub fn push(&mut self, column: impl Into<String>, value: Option<String>) {
        let column = column.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some(existing) => existing.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Value for `column`: `None` if the column is absent, `Some(None)` if it
    /// is present but null
    pub fn get(&self, column: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_deref())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Dedup key: every value in header order joined with `-`, nulls as empty
    ///
    /// Two genuinely distinct rows that agree on every visible field collapse
    /// into one. That is a known limitation of the scheme.
    pub fn identity(&self) -> RowIdentity {
        let joined = self
            .fields
            .iter()
            .map(|(_, value)| value.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join("-");
        RowIdentity(joined)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of column names to strings or nulls")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut row = Row::new();
                while let Some((column, value)) = access.next_entry::<String, Option<String>>()? {
                    row.push(column, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// Derived deduplication key of a [`Row`]; never serialized
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowIdentity(String);

impl RowIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One rendered `td`, as read from the page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCell {
    /// Trimmed text of the whole cell
    pub text: String,
    /// Trimmed text of the cell's labelled sub-element, if it has one
    #[serde(default)]
    pub nested: Option<String>,
}

impl RawCell {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            nested: None,
        }
    }

    pub fn with_nested(text: &str, nested: &str) -> Self {
        Self {
            text: text.to_string(),
            nested: Some(nested.to_string()),
        }
    }
}

/// Everything the table currently renders: header cells plus raw body rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl TableSnapshot {
    /// Map raw body rows onto headers positionally
    ///
    /// Rows whose cell count differs from the header count are dropped
    /// entirely (partially rendered rows, spacer rows). The `rating_column`
    /// takes the nested sub-element text, every other column the full cell
    /// text.
    pub fn into_rows(self, rating_column: &str) -> Vec<Row> {
        if self.headers.is_empty() {
            return Vec::new();
        }

        let total = self.rows.len();
        let rows: Vec<Row> = self
            .rows
            .into_iter()
            .filter(|cells| cells.len() == self.headers.len())
            .map(|cells| {
                let mut row = Row::new();
                for (header, cell) in self.headers.iter().zip(cells) {
                    let value = if header == rating_column {
                        cell.nested
                    } else {
                        Some(cell.text)
                    };
                    row.push(header.clone(), value);
                }
                row
            })
            .collect();

        if rows.len() < total {
            debug!(
                "Skipped {} of {} rendered rows with mismatched cell counts",
                total - rows.len(),
                total
            );
        }

        rows
    }
}
