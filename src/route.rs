//! Route table model shared by every stage of the scan.
//!
//! A [`RouteContext`] is one HTTP-exposed operation as the host service registered it. Route
//! contexts are captured once by a [`RouteSource`] and never mutated afterwards: the grouper
//! partitions them and the listing expander consumes them.
//!
//! # Example
//!
//! ```
//! use apidoc_scanner::route::{HttpMethod, RouteContext, RouteSource, StaticRouteSource};
//!
//! let source = StaticRouteSource::new(vec![
//!     RouteContext::new("/pets", vec![HttpMethod::Get], "list_pets"),
//!     RouteContext::new("/pets/:id", vec![HttpMethod::Get], "get_pet"),
//! ]);
//! assert_eq!(source.routes().unwrap().len(), 2);
//! ```

use crate::error::Result;
use crate::listing::ResponseMessage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of the currently registered routes.
///
/// Implementations return a snapshot: calling `routes` twice on an unchanged host yields the
/// same routes in the same order.
pub trait RouteSource: Send + Sync {
    /// Lists every currently registered route.
    fn routes(&self) -> Result<Vec<RouteContext>>;
}

/// In-memory route source, mostly useful for tests and for hosts that already hold their table.
#[derive(Debug, Clone, Default)]
pub struct StaticRouteSource {
    routes: Vec<RouteContext>,
}

impl StaticRouteSource {
    pub fn new(routes: Vec<RouteContext>) -> Self {
        Self { routes }
    }
}

impl RouteSource for StaticRouteSource {
    fn routes(&self) -> Result<Vec<RouteContext>> {
        Ok(self.routes.clone())
    }
}

/// One HTTP-exposed operation as discovered from the host service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteContext {
    /// The URL path pattern (e.g., "/users/:id" or "/users/{id}")
    pub path: String,
    /// HTTP methods the handler answers to
    pub methods: Vec<HttpMethod>,
    /// Name of the handler serving this route
    pub handler: String,
    /// Media types the handler produces
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    /// Media types the handler consumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<DeclaredParameter>,
    /// Declared response type, if the handler exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<TypeDescriptor>,
    /// Explicit resource tag, used by tag-based grouping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_messages: Vec<ResponseMessage>,
    /// Hidden routes are vetoed by [`crate::readers::HiddenRouteReader`]
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub deprecated: bool,
}

impl RouteContext {
    /// Create a new RouteContext with minimal required fields
    pub fn new(
        path: impl Into<String>,
        methods: Vec<HttpMethod>,
        handler: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            methods,
            handler: handler.into(),
            produces: Vec::new(),
            consumes: Vec::new(),
            parameters: Vec::new(),
            response_type: None,
            tag: None,
            summary: None,
            notes: None,
            response_messages: Vec::new(),
            hidden: false,
            deprecated: false,
        }
    }

    pub fn with_parameter(mut self, parameter: DeclaredParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_response_type(mut self, type_descriptor: TypeDescriptor) -> Self {
        self.response_type = Some(type_descriptor);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_produces(mut self, media_type: impl Into<String>) -> Self {
        self.produces.push(media_type.into());
        self
    }

    pub fn with_consumes(mut self, media_type: impl Into<String>) -> Self {
        self.consumes.push(media_type.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// The path in `{param}` form.
    pub fn normalized_path(&self) -> String {
        normalize_path(&self.path)
    }

    /// Methods the route answers to; a route declaring none answers to every method.
    pub fn effective_methods(&self) -> &[HttpMethod] {
        if self.methods.is_empty() {
            &HttpMethod::ALL
        } else {
            &self.methods
        }
    }
}

/// HTTP methods a route can answer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// Every method, in declaration order.
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter as declared by the handler, before model resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(rename = "type")]
    pub type_descriptor: TypeDescriptor,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DeclaredParameter {
    /// Create a new DeclaredParameter
    pub fn new(
        name: impl Into<String>,
        location: ParameterLocation,
        type_descriptor: TypeDescriptor,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            type_descriptor,
            required,
            description: None,
        }
    }
}

/// Where a parameter value is carried in an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Body,
    Header,
    Form,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Body => "body",
            ParameterLocation::Header => "header",
            ParameterLocation::Form => "form",
        }
    }
}

/// Type information for a parameter or response, as the host declared it.
///
/// Descriptors are written as type expressions: `Pet`, `Vec<Pet>`, `Option<u32>`,
/// `Page<Pet>`. The string form is what manifests carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeDescriptor {
    /// The base type name (e.g., "String", "Pet", "i32")
    pub name: String,
    /// Generic type arguments (e.g., for `Vec<Pet>`, contains the descriptor for Pet)
    pub generic_args: Vec<TypeDescriptor>,
    /// Whether this type is wrapped in `Option<T>`
    pub is_option: bool,
    /// Whether this type is a `Vec<T>` (array type)
    pub is_vec: bool,
    /// Declared collection name for array types (`Vec`, `List` or `Set`)
    pub collection: Option<String>,
}

impl TypeDescriptor {
    /// Create a new TypeDescriptor for a simple type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generic_args: Vec::new(),
            is_option: false,
            is_vec: false,
            collection: None,
        }
    }

    /// Create a TypeDescriptor for an `Option<T>` type
    pub fn option(inner: TypeDescriptor) -> Self {
        Self {
            name: inner.name.clone(),
            generic_args: vec![inner],
            is_option: true,
            is_vec: false,
            collection: None,
        }
    }

    /// Create a TypeDescriptor for a `Vec<T>` type
    pub fn vec(inner: TypeDescriptor) -> Self {
        Self::collection("Vec", inner)
    }

    /// Create an array TypeDescriptor under its declared collection name, e.g. `Set<T>`
    pub fn collection(collection: impl Into<String>, inner: TypeDescriptor) -> Self {
        Self {
            name: inner.name.clone(),
            generic_args: vec![inner],
            is_option: false,
            is_vec: true,
            collection: Some(collection.into()),
        }
    }

    /// Parses a type expression such as `Vec<Option<Pet>>`.
    ///
    /// Malformed expressions are kept verbatim as a plain type name; they will fail model
    /// resolution later and degrade to the opaque placeholder.
    pub fn parse(expression: &str) -> Self {
        let expression = expression.trim();
        let Some(open) = expression.find('<') else {
            return Self::new(expression);
        };
        if !expression.ends_with('>') {
            return Self::new(expression);
        }

        let outer = expression[..open].trim();
        let inner = &expression[open + 1..expression.len() - 1];
        let args: Vec<TypeDescriptor> =
            split_top_level(inner).into_iter().map(Self::parse).collect();

        match (outer, args.as_slice()) {
            ("Option", [single]) => Self::option(single.clone()),
            ("Vec" | "List" | "Set", [single]) => Self::collection(outer, single.clone()),
            _ => Self {
                name: outer.to_string(),
                generic_args: args,
                is_option: false,
                is_vec: false,
                collection: None,
            },
        }
    }

    /// The innermost descriptor once `Option` wrappers are removed.
    pub fn unwrap_option(&self) -> &TypeDescriptor {
        match (self.is_option, self.generic_args.first()) {
            (true, Some(inner)) => inner.unwrap_option(),
            _ => self,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outer = if self.is_option {
            "Option"
        } else if self.is_vec {
            self.collection.as_deref().unwrap_or("Vec")
        } else {
            self.name.as_str()
        };
        if self.generic_args.is_empty() {
            return f.write_str(outer);
        }
        let args: Vec<String> = self.generic_args.iter().map(ToString::to_string).collect();
        write!(f, "{}<{}>", outer, args.join(", "))
    }
}

impl From<String> for TypeDescriptor {
    fn from(expression: String) -> Self {
        Self::parse(&expression)
    }
}

impl From<&str> for TypeDescriptor {
    fn from(expression: &str) -> Self {
        Self::parse(expression)
    }
}

impl From<TypeDescriptor> for String {
    fn from(descriptor: TypeDescriptor) -> Self {
        descriptor.to_string()
    }
}

/// Splits generic arguments on commas that are not nested inside another `<...>`.
fn split_top_level(arguments: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in arguments.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&arguments[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&arguments[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

/// Convert path format from :param or {param} to `{param}` format
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|part| match part.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name),
            None => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether a path segment is a variable (`{id}` or `:id`).
pub fn is_variable_segment(segment: &str) -> bool {
    segment.starts_with(':') || (segment.starts_with('{') && segment.ends_with('}'))
}
