//! JSON export of a finished collection

use crate::collection::Collection;
use crate::{HarvestError, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Render rows as a pretty-printed JSON array, four-space indent, keys in
/// header order
pub fn to_json_string(collection: &Collection) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    collection.serialize(&mut serializer)?;
    String::from_utf8(buf)
        .map_err(|e| HarvestError::Other(format!("Export is not valid UTF-8: {}", e)))
}

/// Write `collection` to `path`
///
/// The file is written next to its destination under a temporary name and
/// renamed into place, so a failed write never leaves a partial output file.
pub async fn write_json(path: &Path, collection: &Collection) -> Result<()> {
    let json = to_json_string(collection)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = staging_path(path);
    debug!("Writing {} bytes to {}", json.len(), tmp.display());
    tokio::fs::write(&tmp, json.as_bytes()).await?;

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    info!("Saved {} rows to {}", collection.len(), path.display());
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Row;
    use tempfile::TempDir;

    fn sample() -> Collection {
        let mut collection = Collection::new();
        collection.insert(
            Row::new()
                .with("Name", Some("Lamp"))
                .with("Price", Some("12.50"))
                .with("Rating", Some("4.5")),
        );
        collection.insert(
            Row::new()
                .with("Name", Some("Desk"))
                .with("Price", Some("99.00"))
                .with("Rating", None),
        );
        collection
    }

    #[test]
    fn test_pretty_printed_with_four_spaces() {
        let json = to_json_string(&sample()).unwrap();
        assert!(json.starts_with("[\n    {\n        \"Name\": \"Lamp\""));
        assert!(json.contains("\"Rating\": null"));
    }

    #[test]
    fn test_non_ascii_values_kept_verbatim() {
        let mut collection = Collection::new();
        collection.insert(Row::new().with("Name", Some("Café lamp ☕")));

        let json = to_json_string(&collection).unwrap();
        assert!(json.contains("\"Name\": \"Café lamp ☕\""));
    }

    #[test]
    fn test_empty_collection_is_empty_array() {
        assert_eq!(to_json_string(&Collection::new()).unwrap(), "[]");
    }

    #[test]
    fn test_round_trip_matches_rows_without_identity() {
        let collection = sample();
        let json = to_json_string(&collection).unwrap();

        let parsed: Vec<Row> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, collection.rows());

        let raw: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(&json).unwrap();
        for (object, row) in raw.iter().zip(collection.rows()) {
            assert_eq!(object.len(), row.len());
            assert!(!object.contains_key("uniqueId"));
            assert!(object.values().all(|v| v.as_str() != Some(row.identity().as_str())));
        }
    }

    #[tokio::test]
    async fn test_write_json_creates_file_and_no_staging_leftover() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("products.json");

        write_json(&path, &sample()).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Row> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_staging_path_is_sibling() {
        let path = Path::new("/tmp/data/products.json");
        assert_eq!(
            staging_path(path),
            PathBuf::from("/tmp/data/products.json.partial")
        );
    }
}
