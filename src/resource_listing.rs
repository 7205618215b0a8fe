//! The scan pipeline: grouping → per-group expansion → ordering → assembly.
//!
//! A [`ScanConfig`] wires every pluggable strategy before the scan runs;
//! [`ResourceListingScanner::scan`] then turns a route snapshot into a [`Document`] and a
//! [`ScanReport`]. The only fatal error is a configuration error, detected before any route is
//! looked at. A group whose expansion fails keeps its reference and is reported instead.
//!
//! # Example
//!
//! ```
//! use apidoc_scanner::grouping::FirstPathSegmentGrouping;
//! use apidoc_scanner::resource_listing::{ResourceListingScanner, ScanConfig};
//! use apidoc_scanner::route::{HttpMethod, RouteContext};
//!
//! let config = ScanConfig::new("default")
//!     .grouping(FirstPathSegmentGrouping::new())
//!     .api_version("1.0");
//! let outcome = ResourceListingScanner::new(config)
//!     .scan(vec![
//!         RouteContext::new("/pets", vec![HttpMethod::Get], "list_pets"),
//!         RouteContext::new("/pets", vec![HttpMethod::Post], "create_pet"),
//!     ])
//!     .unwrap();
//! assert_eq!(outcome.document.references().len(), 1);
//! assert_eq!(outcome.document.listing("pets").unwrap().operations.len(), 2);
//! ```

use crate::authorization::{AuthorizationContextProvider, AuthorizationType};
use crate::document::{
    ApiInfo, Document, DocumentAssembler, DocumentationType, EmptyGroupPolicy, GroupFailure,
    ScanReport,
};
use crate::error::{Error, Result};
use crate::evaluator::RouteEvaluator;
use crate::grouping::{ListingReference, ResourceGroupingStrategy, RouteGrouper};
use crate::listing::{Expansion, ListingExpander};
use crate::model::{ModelRegistry, ModelResolver};
use crate::ordering::{
    LexicographicOperationOrdering, LexicographicReferenceOrdering, OperationOrdering,
    ReferenceOrdering,
};
use crate::paths::{PathProvider, RelativePathProvider};
use crate::readers::MappingReader;
use crate::route::{RouteContext, RouteSource};
use crate::settings::GlobalSettings;
use dashmap::DashMap;
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Everything a scan needs, wired before it runs.
#[derive(Clone)]
pub struct ScanConfig {
    group: String,
    api_version: String,
    documentation_type: DocumentationType,
    info: Option<ApiInfo>,
    authorization_types: Vec<AuthorizationType>,
    grouping: Option<Arc<dyn ResourceGroupingStrategy>>,
    reference_ordering: Arc<dyn ReferenceOrdering>,
    operation_ordering: Arc<dyn OperationOrdering>,
    model_resolver: Arc<dyn ModelResolver>,
    path_provider: Arc<dyn PathProvider>,
    authorization_context: Option<Arc<dyn AuthorizationContextProvider>>,
    readers: Vec<Arc<dyn MappingReader>>,
    evaluator: Option<Arc<dyn RouteEvaluator>>,
    settings: GlobalSettings,
    empty_group_policy: EmptyGroupPolicy,
    parallel: bool,
}

impl ScanConfig {
    /// Configuration for the given group label with every strategy at its default.
    ///
    /// No grouping strategy is set: scanning without calling [`ScanConfig::grouping`] is a
    /// configuration error.
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            api_version: "1".to_string(),
            documentation_type: DocumentationType::default(),
            info: None,
            authorization_types: Vec::new(),
            grouping: None,
            reference_ordering: Arc::new(LexicographicReferenceOrdering),
            operation_ordering: Arc::new(LexicographicOperationOrdering),
            model_resolver: Arc::new(ModelRegistry::new()),
            path_provider: Arc::new(RelativePathProvider::new()),
            authorization_context: None,
            readers: Vec::new(),
            evaluator: None,
            settings: GlobalSettings::default(),
            empty_group_policy: EmptyGroupPolicy::Retain,
            parallel: false,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn documentation_type(mut self, documentation_type: DocumentationType) -> Self {
        self.documentation_type = documentation_type;
        self
    }

    pub fn info(mut self, info: ApiInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn authorization_types(mut self, authorization_types: Vec<AuthorizationType>) -> Self {
        self.authorization_types = authorization_types;
        self
    }

    pub fn grouping(mut self, strategy: impl ResourceGroupingStrategy + 'static) -> Self {
        self.grouping = Some(Arc::new(strategy));
        self
    }

    pub fn reference_ordering(mut self, ordering: impl ReferenceOrdering + 'static) -> Self {
        self.reference_ordering = Arc::new(ordering);
        self
    }

    pub fn operation_ordering(mut self, ordering: impl OperationOrdering + 'static) -> Self {
        self.operation_ordering = Arc::new(ordering);
        self
    }

    pub fn model_resolver(mut self, resolver: impl ModelResolver + 'static) -> Self {
        self.model_resolver = Arc::new(resolver);
        self
    }

    pub fn path_provider(mut self, provider: impl PathProvider + 'static) -> Self {
        self.path_provider = Arc::new(provider);
        self
    }

    pub fn authorization_context(
        mut self,
        provider: impl AuthorizationContextProvider + 'static,
    ) -> Self {
        self.authorization_context = Some(Arc::new(provider));
        self
    }

    /// Append a reader; readers run in the order they were added.
    pub fn reader(mut self, reader: impl MappingReader + 'static) -> Self {
        self.readers.push(Arc::new(reader));
        self
    }

    pub fn evaluator(mut self, evaluator: impl RouteEvaluator + 'static) -> Self {
        self.evaluator = Some(Arc::new(evaluator));
        self
    }

    pub fn settings(mut self, settings: GlobalSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn empty_group_policy(mut self, policy: EmptyGroupPolicy) -> Self {
        self.empty_group_policy = policy;
        self
    }

    /// Expand resource groups on separate threads.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Checks the configuration and hands back the grouping strategy.
    fn validate(&self) -> Result<&dyn ResourceGroupingStrategy> {
        if self.group.trim().is_empty() {
            return Err(Error::InvalidConfiguration("group label must not be empty".to_string()));
        }
        if self.api_version.trim().is_empty() {
            return Err(Error::InvalidConfiguration("API version must not be empty".to_string()));
        }
        if self.documentation_type.version.trim().is_empty() {
            return Err(Error::InvalidConfiguration(
                "document-format version must not be empty".to_string(),
            ));
        }
        self.grouping
            .as_deref()
            .ok_or_else(|| Error::GroupingNotConfigured(self.group.clone()))
    }
}

/// Result of a successful scan
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub document: Document,
    pub report: ScanReport,
}

/// Runs scans for one configuration. Holds no state between scans.
pub struct ResourceListingScanner {
    config: ScanConfig,
}

impl ResourceListingScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan the routes of a route source.
    pub fn scan_source(&self, source: &dyn RouteSource) -> Result<ScanOutcome> {
        self.config.validate()?;
        self.scan(source.routes()?)
    }

    /// Scan a route snapshot into a document.
    pub fn scan(&self, routes: Vec<RouteContext>) -> Result<ScanOutcome> {
        let config = &self.config;
        let grouping = config.validate()?;
        info!("Scanning {} routes for group '{}'", routes.len(), config.group);

        let grouped = RouteGrouper::new(grouping, config.path_provider.as_ref()).group(routes);
        let mut report = ScanReport {
            ungrouped_routes: grouped.ungrouped,
            ..ScanReport::default()
        };

        let expander = ListingExpander::new(config.model_resolver.as_ref())
            .with_authorization(config.authorization_context.as_deref())
            .with_readers(&config.readers)
            .with_evaluator(config.evaluator.as_deref())
            .with_ordering(config.operation_ordering.as_ref())
            .with_settings(&config.settings)
            .with_versions(&config.api_version, &config.documentation_type.version)
            .with_base_path(config.path_provider.application_base_path());

        let references = grouped.references;
        let work: Vec<(ListingReference, Vec<RouteContext>)> = references
            .iter()
            .cloned()
            .zip(grouped.mappings.into_values())
            .collect();

        let results = if config.parallel {
            expand_parallel(&expander, work)
        } else {
            work.into_iter()
                .map(|(reference, routes)| {
                    let outcome = expand_guarded(&expander, &reference, routes);
                    (reference.name, outcome)
                })
                .collect()
        };

        let mut listings = IndexMap::new();
        for (name, outcome) in results {
            match outcome {
                Ok(Expansion { listing, stats }) => {
                    report.rejected_routes.extend(stats.rejected);
                    report.vetoed_operations.extend(stats.vetoed);
                    report.unresolved_types.extend(stats.unresolved);
                    listings.insert(name, listing);
                }
                Err(e) => {
                    warn!("Failed to build listing for resource group '{}': {}", name, e);
                    report.failed_groups.push(GroupFailure {
                        group: name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let ordering = config.reference_ordering.as_ref();
        let assembler = DocumentAssembler::new(ordering, config.api_version.clone())
            .with_documentation_type(config.documentation_type.clone())
            .with_authorization_types(config.authorization_types.clone())
            .with_info(config.info.clone())
            .with_documentation_base_path(config.path_provider.documentation_base_path())
            .with_empty_group_policy(config.empty_group_policy);
        let (document, report) = assembler.assemble(&config.group, references, listings, report);

        debug!(
            "Scan of group '{}' produced {} references and {} listings",
            config.group,
            document.references().len(),
            document.listings.len()
        );
        Ok(ScanOutcome { document, report })
    }
}

/// Expand one group, turning a panic in any collaborator into an error for that group only.
fn expand_guarded(
    expander: &ListingExpander<'_>,
    reference: &ListingReference,
    routes: Vec<RouteContext>,
) -> Result<Expansion> {
    panic::catch_unwind(AssertUnwindSafe(|| expander.expand(reference, routes))).unwrap_or_else(
        |payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            Err(Error::ExpansionPanicked {
                group: reference.name.clone(),
                message,
            })
        },
    )
}

/// Expand every group on its own scoped thread, returning results in work order.
fn expand_parallel(
    expander: &ListingExpander<'_>,
    work: Vec<(ListingReference, Vec<RouteContext>)>,
) -> Vec<(String, Result<Expansion>)> {
    let order: Vec<String> = work.iter().map(|(reference, _)| reference.name.clone()).collect();
    let results: DashMap<String, Result<Expansion>> = DashMap::with_capacity(work.len());

    std::thread::scope(|scope| {
        for (reference, routes) in work {
            let results = &results;
            scope.spawn(move || {
                let outcome = expand_guarded(expander, &reference, routes);
                results.insert(reference.name, outcome);
            });
        }
    });

    order
        .into_iter()
        .filter_map(|name| results.remove(&name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::FirstPathSegmentGrouping;
    use crate::route::HttpMethod;

    fn routes() -> Vec<RouteContext> {
        vec![
            RouteContext::new("/pets", vec![HttpMethod::Get], "list_pets"),
            RouteContext::new("/pets", vec![HttpMethod::Post], "create_pet"),
            RouteContext::new("/pets/{id}", vec![HttpMethod::Get], "get_pet"),
        ]
    }

    #[test]
    fn test_missing_grouping_is_configuration_error() {
        let err = ResourceListingScanner::new(ScanConfig::new("default"))
            .scan(routes())
            .unwrap_err();
        assert!(matches!(err, Error::GroupingNotConfigured(ref group) if group == "default"));
    }

    #[test]
    fn test_empty_api_version_is_rejected() {
        let config = ScanConfig::new("default")
            .grouping(FirstPathSegmentGrouping::new())
            .api_version(" ");
        let err = ResourceListingScanner::new(config).scan(routes()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_defaults() {
        let config = ScanConfig::new("default").grouping(FirstPathSegmentGrouping::new());
        let outcome = ResourceListingScanner::new(config).scan(routes()).unwrap();
        let listing = &outcome.document.resource_listing;
        assert_eq!(listing.api_version, "1");
        assert_eq!(listing.swagger_version, "1.2");
        assert!(listing.authorizations.is_empty());
        assert!(listing.info.is_none());
        assert_eq!(outcome.report.resource_count, 1);
        assert_eq!(outcome.report.locations[0].location, "/api-docs/pets");
        assert!(outcome.report.is_complete());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut many = routes();
        many.push(RouteContext::new("/stores", vec![HttpMethod::Get], "list_stores"));
        many.push(RouteContext::new("/users/:id", vec![HttpMethod::Delete], "delete_user"));

        let sequential = ResourceListingScanner::new(
            ScanConfig::new("default").grouping(FirstPathSegmentGrouping::new()),
        )
        .scan(many.clone())
        .unwrap();
        let parallel = ResourceListingScanner::new(
            ScanConfig::new("default")
                .grouping(FirstPathSegmentGrouping::new())
                .parallel(true),
        )
        .scan(many)
        .unwrap();

        assert_eq!(sequential.document, parallel.document);
        assert_eq!(sequential.report, parallel.report);
    }

    fn panicking_on_stores(
        operation: crate::listing::OperationDescription,
        route: &RouteContext,
    ) -> Result<crate::readers::ReaderOutcome> {
        if route.path.starts_with("/stores") {
            panic!("store catalogue offline");
        }
        Ok(crate::readers::ReaderOutcome::Keep(operation))
    }

    #[test]
    fn test_panicking_reader_fails_only_its_group() {
        for parallel in [false, true] {
            let mut all = routes();
            all.push(RouteContext::new("/stores", vec![HttpMethod::Get], "list_stores"));
            let config = ScanConfig::new("default")
                .grouping(FirstPathSegmentGrouping::new())
                .reader(panicking_on_stores)
                .parallel(parallel);

            let outcome = ResourceListingScanner::new(config).scan(all).unwrap();

            assert!(outcome.document.listing("pets").is_some());
            assert!(outcome.document.listing("stores").is_none());
            assert!(outcome.document.references().iter().any(|r| r.name == "stores"));
            assert_eq!(outcome.report.failed_groups.len(), 1);
            assert_eq!(outcome.report.failed_groups[0].group, "stores");
            assert!(outcome.report.failed_groups[0].reason.contains("store catalogue offline"));
        }
    }
}
