//! Serialization of scanned documents to YAML or JSON.
//!
//! Output is deterministic: maps in a [`Document`] are either insertion-ordered in reference
//! order or sorted, so two scans of the same routes serialize byte for byte identically.

use crate::document::Document;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a document to YAML.
///
/// # Example
///
/// ```
/// use apidoc_scanner::grouping::FirstPathSegmentGrouping;
/// use apidoc_scanner::resource_listing::{ResourceListingScanner, ScanConfig};
/// use apidoc_scanner::route::{HttpMethod, RouteContext};
/// use apidoc_scanner::serializer::serialize_yaml;
///
/// let config = ScanConfig::new("default").grouping(FirstPathSegmentGrouping::new());
/// let routes = vec![RouteContext::new("/pets", vec![HttpMethod::Get], "list_pets")];
/// let outcome = ResourceListingScanner::new(config).scan(routes).unwrap();
/// let yaml = serialize_yaml(&outcome.document).unwrap();
/// assert!(yaml.contains("swaggerVersion"));
/// ```
pub fn serialize_yaml(doc: &Document) -> Result<String> {
    debug!("Serializing document for group '{}' to YAML", doc.group);
    serde_yaml::to_string(doc).context("Failed to serialize document to YAML")
}

/// Serializes a document to pretty-printed JSON.
pub fn serialize_json(doc: &Document) -> Result<String> {
    debug!("Serializing document for group '{}' to JSON", doc.group);
    serde_json::to_string_pretty(doc).context("Failed to serialize document to JSON")
}

/// Writes string content to a file, creating parent directories as needed.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ApiInfo, ResourceListing};
    use crate::grouping::ListingReference;
    use crate::listing::{GroupListing, OperationDescription};
    use crate::route::HttpMethod;
    use indexmap::IndexMap;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn create_test_document() -> Document {
        let mut listings = IndexMap::new();
        listings.insert(
            "pets".to_string(),
            GroupListing {
                api_version: "1".to_string(),
                swagger_version: "1.2".to_string(),
                base_path: "/".to_string(),
                resource_path: "/pets".to_string(),
                description: Some("Pets".to_string()),
                position: 0,
                produces: vec![],
                consumes: vec![],
                operations: vec![OperationDescription::new(HttpMethod::Get, "/pets", "list_pets")],
                models: BTreeMap::new(),
            },
        );
        Document {
            group: "default".to_string(),
            resource_listing: ResourceListing {
                api_version: "1".to_string(),
                swagger_version: "1.2".to_string(),
                apis: vec![ListingReference {
                    name: "pets".to_string(),
                    path: "/pets".to_string(),
                    description: Some("Pets".to_string()),
                    position: 0,
                }],
                authorizations: vec![],
                info: Some(ApiInfo::new("Pet Store")),
            },
            listings,
        }
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("resourceListing:"));
        assert!(yaml.contains("swaggerVersion:"));
        assert!(yaml.contains("title: Pet Store"));
        assert!(yaml.contains("resourcePath: /pets"));
        assert!(yaml.contains("nickname: list_pets"));
    }

    #[test]
    fn test_serialize_json() {
        let json = serialize_json(&create_test_document()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["resourceListing"]["apiVersion"], "1");
        assert_eq!(parsed["resourceListing"]["apis"][0]["path"], "/pets");
        assert_eq!(parsed["listings"]["pets"]["operations"][0]["method"], "GET");
        assert!(parsed["listings"]["pets"]["operations"][0].get("deprecated").is_none());
    }

    #[test]
    fn test_serialize_json_pretty_format() {
        let json = serialize_json(&create_test_document()).unwrap();

        assert!(json.contains('\n'));
        assert!(json.contains("  "));
        assert!(json.lines().count() > 5, "Pretty printed JSON should have multiple lines");
    }

    #[test]
    fn test_serialized_yaml_reads_back() {
        let doc = create_test_document();
        let yaml = serialize_yaml(&doc).unwrap();

        let deserialized: Document = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(deserialized, doc);
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("api-docs.json");
        let json = serialize_json(&create_test_document()).unwrap();

        write_to_file(&json, &file_path).unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        let deserialized: Document = serde_json::from_str(&content).unwrap();
        assert_eq!(deserialized.resource_listing.apis.len(), 1);
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("api-docs.yaml");

        write_to_file("initial content", &file_path).unwrap();
        write_to_file("new content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }
}
