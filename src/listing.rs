use crate::authorization::{AuthorizationContextProvider, AuthorizationRequirement};
use crate::error::{Error, Result};
use crate::evaluator::RouteEvaluator;
use crate::grouping::ListingReference;
use crate::model::{Model, ModelReference, ModelResolver};
use crate::ordering::{sort_operations, LexicographicOperationOrdering, OperationOrdering};
use crate::readers::{MappingReader, ReaderOutcome};
use crate::route::{DeclaredParameter, HttpMethod, ParameterLocation, RouteContext, TypeDescriptor};
use crate::settings::GlobalSettings;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

/// One documented operation within a group listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescription {
    pub method: HttpMethod,
    /// Path in `{param}` form
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Unique name of the operation, derived from the handler
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<DescribedParameter>,
    /// Response data type; `None` when the handler returns nothing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_model: Option<ModelReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_messages: Vec<ResponseMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorizations: Vec<AuthorizationRequirement>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl OperationDescription {
    /// Create a bare operation with no parameters and no response model
    pub fn new(method: HttpMethod, path: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            summary: None,
            notes: None,
            nickname: nickname.into(),
            produces: Vec::new(),
            consumes: Vec::new(),
            parameters: Vec::new(),
            response_model: None,
            response_messages: Vec::new(),
            authorizations: Vec::new(),
            deprecated: false,
        }
    }

    /// Whether the operation takes a request body or form fields.
    pub fn has_body(&self) -> bool {
        self.parameters
            .iter()
            .any(|p| matches!(p.location, ParameterLocation::Body | ParameterLocation::Form))
    }

    /// Every model id this operation refers to.
    fn referenced_models(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter_map(|p| p.data.model_id())
            .chain(self.response_model.iter().filter_map(|m| m.model_id()))
            .chain(self.response_messages.iter().filter_map(|m| m.response_model.as_deref()))
    }
}

/// An operation parameter after model resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribedParameter {
    pub name: String,
    #[serde(rename = "paramType")]
    pub location: ParameterLocation,
    #[serde(flatten)]
    pub data: ModelReference,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A documented response status for an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_model: Option<String>,
}

impl ResponseMessage {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            response_model: None,
        }
    }
}

/// The full expansion of one resource group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupListing {
    pub api_version: String,
    /// Document-format version
    pub swagger_version: String,
    pub base_path: String,
    pub resource_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub position: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    pub operations: Vec<OperationDescription>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, Model>,
}

/// A group listing plus what happened to the routes that did not make it in
#[derive(Debug, Clone, Default)]
pub struct ExpansionStats {
    /// Routes rejected by the evaluator, as `METHODS path`
    pub rejected: Vec<String>,
    /// Operations vetoed by a reader, as `METHOD path`
    pub vetoed: Vec<String>,
    /// Type expressions that fell back to the opaque placeholder
    pub unresolved: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct Expansion {
    pub listing: GroupListing,
    pub stats: ExpansionStats,
}

/// Expands the routes of one resource group into its listing.
pub struct ListingExpander<'a> {
    model_resolver: &'a dyn ModelResolver,
    authorization: Option<&'a dyn AuthorizationContextProvider>,
    readers: &'a [Arc<dyn MappingReader>],
    evaluator: Option<&'a dyn RouteEvaluator>,
    ordering: &'a dyn OperationOrdering,
    settings: Option<&'a GlobalSettings>,
    api_version: &'a str,
    document_format_version: &'a str,
    base_path: String,
}

impl<'a> ListingExpander<'a> {
    /// Create an expander with no authorization, readers or evaluator, and default ordering
    pub fn new(model_resolver: &'a dyn ModelResolver) -> Self {
        Self {
            model_resolver,
            authorization: None,
            readers: &[],
            evaluator: None,
            ordering: &LexicographicOperationOrdering,
            settings: None,
            api_version: "1",
            document_format_version: "1.2",
            base_path: "/".to_string(),
        }
    }

    pub fn with_authorization(
        mut self,
        provider: Option<&'a dyn AuthorizationContextProvider>,
    ) -> Self {
        self.authorization = provider;
        self
    }

    pub fn with_readers(mut self, readers: &'a [Arc<dyn MappingReader>]) -> Self {
        self.readers = readers;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Option<&'a dyn RouteEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_ordering(mut self, ordering: &'a dyn OperationOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_settings(mut self, settings: &'a GlobalSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_versions(mut self, api_version: &'a str, document_format_version: &'a str) -> Self {
        self.api_version = api_version;
        self.document_format_version = document_format_version;
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Expand a group's routes into its listing.
    ///
    /// Fails only when a mapping reader fails; every other problem degrades in place.
    pub fn expand(
        &self,
        reference: &ListingReference,
        routes: Vec<RouteContext>,
    ) -> Result<Expansion> {
        debug!("Expanding resource group '{}' ({} routes)", reference.name, routes.len());
        let mut stats = ExpansionStats::default();
        let mut operations = Vec::new();

        for route in routes {
            if let Some(evaluator) = self.evaluator {
                if !evaluator.accepts(&route) {
                    debug!("Route {} rejected by evaluator", route.path);
                    let methods = join_methods(route.effective_methods());
                    stats.rejected.push(format!("{} {}", methods, route.path));
                    continue;
                }
            }

            let path = route.normalized_path();
            for &method in route.effective_methods() {
                let operation = self.describe(&route, method, &path, &mut stats.unresolved);
                match self.run_readers(operation, &route)? {
                    Some(operation) => operations.push(operation),
                    None => stats.vetoed.push(format!("{} {}", method, path)),
                }
            }
        }

        sort_operations(&mut operations, self.ordering);

        let listing = GroupListing {
            api_version: self.api_version.to_string(),
            swagger_version: self.document_format_version.to_string(),
            base_path: self.base_path.clone(),
            resource_path: reference.path.clone(),
            description: reference.description.clone(),
            position: reference.position,
            produces: union_of(operations.iter().map(|o| &o.produces)),
            consumes: union_of(operations.iter().map(|o| &o.consumes)),
            models: self.collect_models(&operations),
            operations,
        };

        Ok(Expansion { listing, stats })
    }

    /// Build the operation for one method of a route
    fn describe(
        &self,
        route: &RouteContext,
        method: HttpMethod,
        path: &str,
        unresolved: &mut BTreeSet<String>,
    ) -> OperationDescription {
        let nickname = if route.effective_methods().len() > 1 {
            format!("{}_{}", route.handler, method.as_str().to_lowercase())
        } else {
            route.handler.clone()
        };

        let mut operation = OperationDescription::new(method, path, nickname);
        operation.summary = Some(
            route
                .summary
                .clone()
                .unwrap_or_else(|| format!("{} {}", method, route.path)),
        );
        operation.notes = route.notes.clone();
        operation.produces = route.produces.clone();
        operation.consumes = route.consumes.clone();

        operation.parameters = route
            .parameters
            .iter()
            .filter(|p| !self.is_ignorable(&p.type_descriptor))
            .map(|p| self.describe_parameter(p, unresolved))
            .collect();

        operation.response_model = route
            .response_type
            .as_ref()
            .map(|response_type| self.resolve_or_placeholder(response_type, unresolved));

        operation.response_messages = if route.response_messages.is_empty() {
            self.settings
                .map(|s| s.response_messages_for(method).to_vec())
                .unwrap_or_default()
        } else {
            route.response_messages.clone()
        };

        operation.authorizations = self
            .authorization
            .map(|provider| provider.authorizations_for(path, method))
            .unwrap_or_default();

        operation
    }

    fn describe_parameter(
        &self,
        parameter: &DeclaredParameter,
        unresolved: &mut BTreeSet<String>,
    ) -> DescribedParameter {
        let required = parameter.location == ParameterLocation::Path
            || (parameter.required && !parameter.type_descriptor.is_option);
        DescribedParameter {
            name: parameter.name.clone(),
            location: parameter.location,
            data: self.resolve_or_placeholder(&parameter.type_descriptor, unresolved),
            required,
            description: parameter.description.clone(),
        }
    }

    fn resolve_or_placeholder(
        &self,
        descriptor: &TypeDescriptor,
        unresolved: &mut BTreeSet<String>,
    ) -> ModelReference {
        self.model_resolver.resolve(descriptor).unwrap_or_else(|| {
            debug!("Type {} is unresolved, using opaque placeholder", descriptor);
            unresolved.insert(descriptor.to_string());
            ModelReference::opaque()
        })
    }

    fn is_ignorable(&self, descriptor: &TypeDescriptor) -> bool {
        self.settings
            .is_some_and(|s| s.is_ignorable(&descriptor.unwrap_option().name))
    }

    /// Run the readers in order; `None` means the operation was vetoed
    fn run_readers(
        &self,
        mut operation: OperationDescription,
        route: &RouteContext,
    ) -> Result<Option<OperationDescription>> {
        for reader in self.readers {
            let outcome = reader.enrich_or_veto(operation, route).map_err(|e| match e {
                Error::Reader { .. } => e,
                other => Error::reader(reader.name(), other.to_string()),
            })?;
            match outcome {
                ReaderOutcome::Keep(next) => operation = next,
                ReaderOutcome::Veto => {
                    debug!("Reader '{}' vetoed {} {}", reader.name(), route.path, route.handler);
                    return Ok(None);
                }
            }
        }
        Ok(Some(operation))
    }

    /// Collect the models referenced by the operations, following model properties
    fn collect_models(&self, operations: &[OperationDescription]) -> BTreeMap<String, Model> {
        let mut models = BTreeMap::new();
        let mut pending: VecDeque<String> = operations
            .iter()
            .flat_map(|o| o.referenced_models())
            .map(str::to_string)
            .collect();

        while let Some(id) = pending.pop_front() {
            if models.contains_key(&id) {
                continue;
            }
            match self.model_resolver.model(&id) {
                Some(model) => {
                    pending.extend(model.referenced_models());
                    models.insert(id, model);
                }
                None => debug!("Model {} has no definition", id),
            }
        }
        models
    }
}

fn join_methods(methods: &[HttpMethod]) -> String {
    methods.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(",")
}

/// Union of media type lists, in first-seen order
fn union_of<'a>(lists: impl Iterator<Item = &'a Vec<String>>) -> Vec<String> {
    let mut union: Vec<String> = Vec::new();
    for media_type in lists.flatten() {
        if !union.contains(media_type) {
            union.push(media_type.clone());
        }
    }
    union
}
