//! File-backed route source.
//!
//! Hosts that cannot be introspected in-process export their route table as one or more route
//! manifests (YAML or JSON). A manifest carries the routes and, optionally, the metadata a scan
//! is configured with: API info, declared authorization schemes, authorization rules, model
//! definitions and global settings.
//!
//! ```yaml
//! apiVersion: "1.0"
//! info:
//!   title: Pet Store
//! models:
//!   Pet:
//!     properties:
//!       id: { type: u64, required: true }
//! routes:
//!   - path: /pets/:id
//!     methods: [GET]
//!     handler: get_pet
//!     responseType: Pet
//! ```
//!
//! A directory is walked recursively (hidden and `target` directories are skipped) and every
//! `.yaml`, `.yml` and `.json` file is merged in path order.

use crate::authorization::{
    AuthorizationContext, AuthorizationRequirement, AuthorizationRule, AuthorizationType,
};
use crate::document::ApiInfo;
use crate::error::{Error, Result};
use crate::model::{ModelDefinition, ModelRegistry};
use crate::route::{HttpMethod, RouteContext, RouteSource};
use crate::settings::GlobalSettings;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Contents of one route manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ApiInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorizations: Vec<AuthorizationType>,
    /// Rules attaching authorization requirements to operations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRule>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub models: IndexMap<String, ModelDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<GlobalSettings>,
    #[serde(default)]
    pub routes: Vec<RouteContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRule {
    /// Regular expression matched against the `{param}`-style operation path
    pub path_pattern: String,
    #[serde(default)]
    pub methods: Vec<HttpMethod>,
    pub requirements: Vec<AuthorizationRequirement>,
}

impl RouteManifest {
    /// Load a manifest, picking JSON or YAML from the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading route manifest: {}", path.display());
        let content = fs::read_to_string(path)?;
        let parsed = if has_extension(path, "json") {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| Error::Manifest {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Merge another manifest into this one.
    ///
    /// Routes and rules are appended. Models and authorization schemes already present keep
    /// their first definition. Scalar metadata keeps the first value set.
    pub fn merge(&mut self, other: RouteManifest) {
        self.api_version = self.api_version.take().or(other.api_version);
        self.info = self.info.take().or(other.info);
        self.settings = self.settings.take().or(other.settings);

        for scheme in other.authorizations {
            if self.authorizations.iter().all(|s| s.name() != scheme.name()) {
                self.authorizations.push(scheme);
            }
        }
        for (name, definition) in other.models {
            self.models.entry(name).or_insert(definition);
        }
        self.security.extend(other.security);
        self.routes.extend(other.routes);
    }

    pub fn model_registry(&self) -> ModelRegistry {
        ModelRegistry::from_definitions(self.models.clone())
    }

    /// Builds the rule-based authorization context; fails on an invalid path pattern.
    pub fn authorization_context(&self) -> Result<AuthorizationContext> {
        self.security
            .iter()
            .try_fold(AuthorizationContext::new(), |context, rule| {
                Ok(context.with_rule(AuthorizationRule::new(
                    &rule.path_pattern,
                    rule.methods.clone(),
                    rule.requirements.clone(),
                )?))
            })
    }
}

/// Finds route manifests below a directory.
pub struct ManifestScanner {
    root_path: PathBuf,
}

/// Result of directory scanning operation.
pub struct ManifestScanResult {
    /// Manifest files, sorted by path
    pub manifest_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl ManifestScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Walk the tree, skipping hidden and `target` directories.
    pub fn scan(&self) -> Result<ManifestScanResult> {
        if !self.root_path.is_dir() {
            return Err(Error::Manifest {
                path: self.root_path.clone(),
                message: "not a directory".to_string(),
            });
        }

        let mut manifest_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path).into_iter().filter_entry(|e| {
            if e.path() == self.root_path {
                return true;
            }
            let file_name = e.file_name().to_string_lossy();
            !file_name.starts_with('.') && file_name != "target"
        }) {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    let is_manifest =
                        MANIFEST_EXTENSIONS.iter().any(|ext| has_extension(path, ext));
                    if path.is_file() && is_manifest {
                        manifest_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        manifest_files.sort();
        Ok(ManifestScanResult {
            manifest_files,
            warnings,
        })
    }
}

/// Route source backed by one manifest file or a directory of them.
#[derive(Debug, Clone)]
pub struct ManifestRouteSource {
    manifest: RouteManifest,
    files: Vec<PathBuf>,
    warnings: Vec<String>,
}

impl ManifestRouteSource {
    /// Open a manifest file, or every manifest below a directory.
    ///
    /// A single file that fails to parse is an error. Inside a directory, unparsable files are
    /// skipped with a warning so the remaining routes are still documented.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            let manifest = RouteManifest::load(path)?;
            return Ok(Self {
                manifest,
                files: vec![path.to_path_buf()],
                warnings: Vec::new(),
            });
        }

        let scan = ManifestScanner::new(path.to_path_buf()).scan()?;
        let mut warnings = scan.warnings;
        let mut files = Vec::new();
        let mut manifest = RouteManifest::default();

        for file in scan.manifest_files {
            match RouteManifest::load(&file) {
                Ok(loaded) => {
                    manifest.merge(loaded);
                    files.push(file);
                }
                Err(e) => {
                    warn!("Skipping manifest: {}", e);
                    warnings.push(e.to_string());
                }
            }
        }

        debug!(
            "Loaded {} routes from {} manifests under {}",
            manifest.routes.len(),
            files.len(),
            path.display()
        );
        Ok(Self {
            manifest,
            files,
            warnings,
        })
    }

    pub fn manifest(&self) -> &RouteManifest {
        &self.manifest
    }

    /// Manifest files that were loaded
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl RouteSource for ManifestRouteSource {
    fn routes(&self) -> Result<Vec<RouteContext>> {
        Ok(self.manifest.routes.clone())
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PETS_YAML: &str = r#"
apiVersion: "2.0"
info:
  title: Pet Store
authorizations:
  - type: apiKey
    name: api_key
    keyName: X-Api-Key
    passAs: header
security:
  - pathPattern: "^/pets"
    methods: [POST]
    requirements:
      - type: api_key
models:
  Pet:
    properties:
      id: { type: u64, required: true }
routes:
  - path: /pets
    methods: [GET]
    handler: list_pets
    responseType: Vec<Pet>
  - path: /pets
    methods: [POST]
    handler: create_pet
"#;

    const STORES_JSON: &str = r#"{
  "apiVersion": "9.9",
  "authorizations": [{ "type": "basicAuth", "name": "basic" }],
  "models": { "Pet": { "description": "duplicate" }, "Store": {} },
  "routes": [{ "path": "/stores", "methods": ["GET"], "handler": "list_stores" }]
}"#;

    #[test]
    fn test_load_yaml_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pets.yaml");
        fs::write(&path, PETS_YAML).unwrap();

        let manifest = RouteManifest::load(&path).unwrap();
        assert_eq!(manifest.api_version.as_deref(), Some("2.0"));
        assert_eq!(manifest.info.unwrap().title, "Pet Store");
        assert_eq!(manifest.routes.len(), 2);
        assert_eq!(manifest.authorizations[0].name(), "api_key");
        assert!(manifest.models.contains_key("Pet"));
    }

    #[test]
    fn test_load_invalid_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = RouteManifest::load(&path).unwrap_err();
        assert!(matches!(err, Error::Manifest { .. }));
    }

    #[test]
    fn test_merge_keeps_first_definitions() {
        let mut first: RouteManifest = serde_yaml::from_str(PETS_YAML).unwrap();
        let second: RouteManifest = serde_json::from_str(STORES_JSON).unwrap();
        first.merge(second);

        assert_eq!(first.api_version.as_deref(), Some("2.0"));
        assert_eq!(first.routes.len(), 3);
        assert_eq!(first.authorizations.len(), 2);
        assert!(first.models["Pet"].description.is_none());
        assert!(first.models.contains_key("Store"));
    }

    #[test]
    fn test_authorization_context_from_rules() {
        use crate::authorization::AuthorizationContextProvider;

        let manifest: RouteManifest = serde_yaml::from_str(PETS_YAML).unwrap();
        let context = manifest.authorization_context().unwrap();
        assert_eq!(context.authorizations_for("/pets", HttpMethod::Post)[0].type_name, "api_key");
        assert!(context.authorizations_for("/pets", HttpMethod::Get).is_empty());
    }

    #[test]
    fn test_invalid_rule_pattern() {
        let mut manifest = RouteManifest::default();
        manifest.security.push(SecurityRule {
            path_pattern: "[".to_string(),
            methods: vec![],
            requirements: vec![],
        });
        assert!(matches!(
            manifest.authorization_context().unwrap_err(),
            Error::InvalidConfiguration(_)
        ));
    }

    #[test]
    fn test_scan_skips_hidden_and_target() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("target")).unwrap();
        fs::create_dir(root.join(".cache")).unwrap();
        fs::create_dir(root.join("nested")).unwrap();
        fs::write(root.join("target/routes.yaml"), PETS_YAML).unwrap();
        fs::write(root.join(".cache/routes.yaml"), PETS_YAML).unwrap();
        fs::write(root.join("nested/routes.yml"), PETS_YAML).unwrap();
        fs::write(root.join("readme.md"), "# routes").unwrap();

        let result = ManifestScanner::new(root.to_path_buf()).scan().unwrap();
        assert_eq!(result.manifest_files.len(), 1);
        assert!(result.warnings.is_empty());
        assert!(result.manifest_files[0].ends_with("nested/routes.yml"));
    }

    #[test]
    fn test_open_directory_merges_in_path_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a-pets.yaml"), PETS_YAML).unwrap();
        fs::write(dir.path().join("b-stores.json"), STORES_JSON).unwrap();
        fs::write(dir.path().join("c-broken.yaml"), "routes: [").unwrap();

        let source = ManifestRouteSource::open(dir.path()).unwrap();
        let handlers: Vec<_> = source.routes().unwrap().into_iter().map(|r| r.handler).collect();
        assert_eq!(handlers, vec!["list_pets", "create_pet", "list_stores"]);
        assert_eq!(source.files().len(), 2);
        assert_eq!(source.warnings().len(), 1);
    }

    #[test]
    fn test_open_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stores.json");
        fs::write(&path, STORES_JSON).unwrap();

        let source = ManifestRouteSource::open(&path).unwrap();
        assert_eq!(source.routes().unwrap().len(), 1);
        assert_eq!(source.manifest().model_registry().len(), 2);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ManifestRouteSource::open(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
