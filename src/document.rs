//! The final document and the stage that assembles it.
//!
//! [`DocumentAssembler`] is a pure merge: it orders the listing references, attaches the
//! top-level metadata and keys every group listing by group name. It never filters, except
//! for dropping empty groups when [`EmptyGroupPolicy::Omit`] is configured.
//!
//! The summary of what was produced is returned as a [`ScanReport`] rather than logged;
//! callers decide whether to emit it with [`ScanReport::log`].

use crate::authorization::AuthorizationType;
use crate::grouping::ListingReference;
use crate::listing::GroupListing;
use crate::ordering::{sort_references, ReferenceOrdering};
use crate::paths::DOCUMENTATION_BASE_PATH;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Descriptive metadata about the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
}

impl ApiInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            terms_of_service_url: None,
            contact: None,
            license: None,
            license_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The description format a document is produced in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationType {
    pub name: String,
    pub version: String,
    pub media_type: String,
}

impl DocumentationType {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_media_type(name, version, "application/json")
    }

    pub fn with_media_type(
        name: impl Into<String>,
        version: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            media_type: media_type.into(),
        }
    }

    pub fn swagger_12() -> Self {
        Self::new("swagger", "1.2")
    }
}

impl Default for DocumentationType {
    fn default() -> Self {
        Self::swagger_12()
    }
}

/// Top-level resource listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceListing {
    pub api_version: String,
    /// Document-format version
    pub swagger_version: String,
    pub apis: Vec<ListingReference>,
    #[serde(default)]
    pub authorizations: Vec<AuthorizationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ApiInfo>,
}

/// Complete output of one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Group label the scan was configured with
    pub group: String,
    pub resource_listing: ResourceListing,
    /// Group name → listing, in reference order
    pub listings: IndexMap<String, GroupListing>,
}

impl Document {
    pub fn listing(&self, group_name: &str) -> Option<&GroupListing> {
        self.listings.get(group_name)
    }

    pub fn references(&self) -> &[ListingReference] {
        &self.resource_listing.apis
    }
}

/// What to do with a group whose routes were all filtered out during expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyGroupPolicy {
    /// Keep the reference and an empty listing
    #[default]
    Retain,
    /// Drop both the reference and the listing
    Omit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceLocation {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupFailure {
    pub group: String,
    pub reason: String,
}

/// Summary of one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub group: String,
    pub resource_count: usize,
    /// Resolved location of each reference, in document order
    pub locations: Vec<ReferenceLocation>,
    /// Groups whose listing could not be built; their references are kept
    pub failed_groups: Vec<GroupFailure>,
    pub omitted_empty_groups: Vec<String>,
    pub ungrouped_routes: Vec<String>,
    pub rejected_routes: Vec<String>,
    pub vetoed_operations: Vec<String>,
    pub unresolved_types: BTreeSet<String>,
}

impl ScanReport {
    /// True when every referenced group has its listing.
    pub fn is_complete(&self) -> bool {
        self.failed_groups.is_empty()
    }

    pub fn log(&self) {
        info!(
            "Added a resource listing with ({}) api resources for group '{}'",
            self.resource_count, self.group
        );
        for location in &self.locations {
            info!("  {} at location: {}", location.name, location.location);
        }
        for failure in &self.failed_groups {
            warn!("  {} has no listing: {}", failure.group, failure.reason);
        }
        if !self.unresolved_types.is_empty() {
            warn!("Unresolved types documented as opaque: {:?}", self.unresolved_types);
        }
        debug!(
            "{} ungrouped, {} rejected, {} vetoed, {} empty groups omitted",
            self.ungrouped_routes.len(),
            self.rejected_routes.len(),
            self.vetoed_operations.len(),
            self.omitted_empty_groups.len()
        );
    }
}

/// Merges ordered references, group listings and metadata into a [`Document`].
pub struct DocumentAssembler<'a> {
    ordering: &'a dyn ReferenceOrdering,
    api_version: String,
    documentation_type: DocumentationType,
    authorization_types: Vec<AuthorizationType>,
    info: Option<ApiInfo>,
    documentation_base_path: String,
    empty_group_policy: EmptyGroupPolicy,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(ordering: &'a dyn ReferenceOrdering, api_version: impl Into<String>) -> Self {
        Self {
            ordering,
            api_version: api_version.into(),
            documentation_type: DocumentationType::default(),
            authorization_types: Vec::new(),
            info: None,
            documentation_base_path: DOCUMENTATION_BASE_PATH.to_string(),
            empty_group_policy: EmptyGroupPolicy::Retain,
        }
    }

    pub fn with_documentation_type(mut self, documentation_type: DocumentationType) -> Self {
        self.documentation_type = documentation_type;
        self
    }

    pub fn with_authorization_types(mut self, authorization_types: Vec<AuthorizationType>) -> Self {
        self.authorization_types = authorization_types;
        self
    }

    pub fn with_info(mut self, info: Option<ApiInfo>) -> Self {
        self.info = info;
        self
    }

    pub fn with_documentation_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.documentation_base_path = base_path.into();
        self
    }

    pub fn with_empty_group_policy(mut self, policy: EmptyGroupPolicy) -> Self {
        self.empty_group_policy = policy;
        self
    }

    /// Assemble the document; `report` already carries the grouping and expansion outcomes.
    pub fn assemble(
        &self,
        group: &str,
        mut references: Vec<ListingReference>,
        mut listings: IndexMap<String, GroupListing>,
        mut report: ScanReport,
    ) -> (Document, ScanReport) {
        if self.empty_group_policy == EmptyGroupPolicy::Omit {
            references.retain(|reference| {
                let empty = listings
                    .get(&reference.name)
                    .is_some_and(|listing| listing.operations.is_empty());
                if empty {
                    debug!("Omitting empty resource group '{}'", reference.name);
                    listings.swap_remove(&reference.name);
                    report.omitted_empty_groups.push(reference.name.clone());
                }
                !empty
            });
        }

        sort_references(&mut references, self.ordering);

        let ordered_listings: IndexMap<String, GroupListing> = references
            .iter()
            .filter_map(|reference| {
                listings
                    .swap_remove(&reference.name)
                    .map(|listing| (reference.name.clone(), listing))
            })
            .collect();

        report.group = group.to_string();
        report.resource_count = references.len();
        report.locations = references
            .iter()
            .map(|reference| ReferenceLocation {
                name: reference.name.clone(),
                location: self.resolve_location(reference),
            })
            .collect();

        let resource_listing = ResourceListing {
            api_version: self.api_version.clone(),
            swagger_version: self.documentation_type.version.clone(),
            apis: references,
            authorizations: self.authorization_types.clone(),
            info: self.info.clone(),
        };

        let document = Document {
            group: group.to_string(),
            resource_listing,
            listings: ordered_listings,
        };
        (document, report)
    }

    /// A description starting with `http` is the listing's host prefix; otherwise the listing
    /// lives under the documentation base path.
    fn resolve_location(&self, reference: &ListingReference) -> String {
        let prefix = match reference.description.as_deref() {
            Some(description) if description.starts_with("http") => description,
            _ => self.documentation_base_path.as_str(),
        };
        format!("{}{}", prefix.trim_end_matches('/'), reference.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::{LexicographicReferenceOrdering, PositionReferenceOrdering};
    use std::collections::BTreeMap;

    fn reference(name: &str, position: usize) -> ListingReference {
        ListingReference {
            name: name.to_string(),
            path: format!("/{}", name),
            description: None,
            position,
        }
    }

    fn listing(resource_path: &str, operations: usize) -> GroupListing {
        GroupListing {
            api_version: "1".to_string(),
            swagger_version: "1.2".to_string(),
            base_path: "/".to_string(),
            resource_path: resource_path.to_string(),
            description: None,
            position: 0,
            produces: Vec::new(),
            consumes: Vec::new(),
            operations: (0..operations)
                .map(|i| {
                    crate::listing::OperationDescription::new(
                        crate::route::HttpMethod::Get,
                        resource_path,
                        format!("op{}", i),
                    )
                })
                .collect(),
            models: BTreeMap::new(),
        }
    }

    fn inputs() -> (Vec<ListingReference>, IndexMap<String, GroupListing>) {
        let references = vec![reference("stores", 0), reference("pets", 1), reference("admin", 2)];
        let mut listings = IndexMap::new();
        listings.insert("stores".to_string(), listing("/stores", 1));
        listings.insert("pets".to_string(), listing("/pets", 2));
        listings.insert("admin".to_string(), listing("/admin", 0));
        (references, listings)
    }

    #[test]
    fn test_assemble_orders_references_and_listings() {
        let (references, listings) = inputs();
        let ordering = LexicographicReferenceOrdering;
        let (document, report) = DocumentAssembler::new(&ordering, "1").assemble(
            "default",
            references,
            listings,
            ScanReport::default(),
        );

        let names: Vec<_> = document.references().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["admin", "pets", "stores"]);
        let keys: Vec<_> = document.listings.keys().map(String::as_str).collect();
        assert_eq!(keys, names);
        assert_eq!(document.resource_listing.swagger_version, "1.2");
        assert!(document.resource_listing.authorizations.is_empty());
        assert_eq!(report.resource_count, 3);
        assert_eq!(report.locations[0].location, "/api-docs/admin");
    }

    #[test]
    fn test_position_ordering() {
        let (references, listings) = inputs();
        let ordering = PositionReferenceOrdering;
        let (document, _) = DocumentAssembler::new(&ordering, "1").assemble(
            "default",
            references,
            listings,
            ScanReport::default(),
        );
        assert_eq!(document.references()[0].name, "stores");
    }

    #[test]
    fn test_retain_empty_groups_by_default() {
        let (references, listings) = inputs();
        let ordering = LexicographicReferenceOrdering;
        let (document, report) = DocumentAssembler::new(&ordering, "1").assemble(
            "default",
            references,
            listings,
            ScanReport::default(),
        );
        assert!(document.listing("admin").unwrap().operations.is_empty());
        assert!(report.omitted_empty_groups.is_empty());
    }

    #[test]
    fn test_omit_empty_groups() {
        let (references, listings) = inputs();
        let ordering = LexicographicReferenceOrdering;
        let (document, report) = DocumentAssembler::new(&ordering, "1")
            .with_empty_group_policy(EmptyGroupPolicy::Omit)
            .assemble("default", references, listings, ScanReport::default());
        assert!(document.listing("admin").is_none());
        assert!(document.references().iter().all(|r| r.name != "admin"));
        assert_eq!(report.omitted_empty_groups, vec!["admin".to_string()]);
        assert_eq!(report.resource_count, 2);
    }

    #[test]
    fn test_reference_without_listing_is_kept() {
        let (references, mut listings) = inputs();
        listings.swap_remove("pets");
        let ordering = LexicographicReferenceOrdering;
        let (document, _) = DocumentAssembler::new(&ordering, "1")
            .with_empty_group_policy(EmptyGroupPolicy::Omit)
            .assemble("default", references, listings, ScanReport::default());
        assert!(document.references().iter().any(|r| r.name == "pets"));
        assert!(document.listing("pets").is_none());
    }

    #[test]
    fn test_locations_prefixed_by_http_description() {
        let mut hosted = reference("pets", 0);
        hosted.description = Some("https://docs.example.com/v2/".to_string());
        let mut described = reference("stores", 1);
        described.description = Some("Stores".to_string());
        let ordering = LexicographicReferenceOrdering;
        let (_, report) = DocumentAssembler::new(&ordering, "1")
            .with_documentation_base_path("/docs/")
            .assemble(
                "default",
                vec![described, hosted, reference("users", 2)],
                IndexMap::new(),
                ScanReport::default(),
            );
        let locations: Vec<_> = report.locations.iter().map(|l| l.location.as_str()).collect();
        assert_eq!(
            locations,
            vec!["https://docs.example.com/v2/pets", "/docs/stores", "/docs/users"]
        );
    }

    #[test]
    fn test_metadata() {
        let ordering = LexicographicReferenceOrdering;
        let (document, _) = DocumentAssembler::new(&ordering, "3.1")
            .with_documentation_type(DocumentationType::new("swagger", "1.3"))
            .with_info(Some(ApiInfo::new("Pet Store").with_description("Pets")))
            .with_authorization_types(vec![AuthorizationType::BasicAuth {
                name: "basic".to_string(),
            }])
            .assemble("public", Vec::new(), IndexMap::new(), ScanReport::default());
        assert_eq!(document.group, "public");
        assert_eq!(document.resource_listing.api_version, "3.1");
        assert_eq!(document.resource_listing.swagger_version, "1.3");
        assert_eq!(document.resource_listing.info.as_ref().unwrap().title, "Pet Store");
        assert_eq!(document.resource_listing.authorizations.len(), 1);
    }
}
