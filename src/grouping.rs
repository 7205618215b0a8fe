//! Partitioning of the route table into resource groups.
//!
//! The [`RouteGrouper`] asks a [`ResourceGroupingStrategy`] which group every route belongs to
//! and produces, in discovery order, the routes of each group plus one [`ListingReference`] per
//! group. Routes the strategy declines are left out of the document.
//!
//! # Example
//!
//! ```
//! use apidoc_scanner::grouping::{FirstPathSegmentGrouping, RouteGrouper};
//! use apidoc_scanner::paths::RelativePathProvider;
//! use apidoc_scanner::route::{HttpMethod, RouteContext};
//!
//! let routes = vec![
//!     RouteContext::new("/pets", vec![HttpMethod::Get], "list_pets"),
//!     RouteContext::new("/stores/:id", vec![HttpMethod::Get], "get_store"),
//! ];
//! let grouped = RouteGrouper::new(&FirstPathSegmentGrouping::new(), &RelativePathProvider::new())
//!     .group(routes);
//! assert_eq!(grouped.references.len(), 2);
//! assert_eq!(grouped.references[0].path, "/pets");
//! ```

use crate::paths::PathProvider;
use crate::route::{is_variable_segment, RouteContext};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A named partition of routes. Equality and hashing only consider the name.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub name: String,
    pub position: usize,
}

impl ResourceGroup {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

impl PartialEq for ResourceGroup {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for ResourceGroup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Summary entry for one resource group in the top-level resource listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingReference {
    pub name: String,
    /// Location of the group's listing, relative to the documentation base path
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub position: usize,
}

/// Decides which resource group a route belongs to.
pub trait ResourceGroupingStrategy: Send + Sync {
    /// Group name for a route, or `None` to leave the route undocumented.
    fn group_name_for(&self, route: &RouteContext) -> Option<String>;

    /// Explicit ordering position for a group; `None` means discovery order.
    fn position_for(&self, _group_name: &str) -> Option<usize> {
        None
    }

    fn description_for(&self, group: &ResourceGroup) -> Option<String> {
        Some(describe_group_name(&group.name))
    }
}

impl<F> ResourceGroupingStrategy for F
where
    F: Fn(&RouteContext) -> Option<String> + Send + Sync,
{
    fn group_name_for(&self, route: &RouteContext) -> Option<String> {
        self(route)
    }
}

/// Groups routes by their first literal path segment: `/pets/{id}` belongs to `pets`.
#[derive(Debug, Clone, Default)]
pub struct FirstPathSegmentGrouping {
    skip_prefix: Option<String>,
}

impl FirstPathSegmentGrouping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore a fixed leading prefix such as `/api/v1` before picking the segment.
    pub fn skipping_prefix(prefix: impl Into<String>) -> Self {
        Self {
            skip_prefix: Some(prefix.into()),
        }
    }
}

impl ResourceGroupingStrategy for FirstPathSegmentGrouping {
    fn group_name_for(&self, route: &RouteContext) -> Option<String> {
        let mut path = route.path.as_str();
        if let Some(prefix) = &self.skip_prefix {
            let prefix = prefix.trim_end_matches('/');
            if let Some(rest) = path.strip_prefix(prefix) {
                if rest.is_empty() || rest.starts_with('/') {
                    path = rest;
                }
            }
        }

        let segment = path.split('/').find(|s| !s.is_empty())?;
        if is_variable_segment(segment) {
            return None;
        }
        Some(segment.to_string())
    }
}

/// Groups routes by their declared tag, optionally falling back to another strategy.
#[derive(Default)]
pub struct TagGrouping {
    fallback: Option<Box<dyn ResourceGroupingStrategy>>,
}

impl TagGrouping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: impl ResourceGroupingStrategy + 'static) -> Self {
        Self {
            fallback: Some(Box::new(fallback)),
        }
    }
}

impl ResourceGroupingStrategy for TagGrouping {
    fn group_name_for(&self, route: &RouteContext) -> Option<String> {
        match route.tag.as_deref().map(str::trim) {
            Some(tag) if !tag.is_empty() => Some(tag.to_string()),
            _ => self.fallback.as_ref()?.group_name_for(route),
        }
    }
}

/// Turns `pet-store` or `pet_store` into `Pet Store`.
pub fn describe_group_name(name: &str) -> String {
    name.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Output of the grouping stage.
#[derive(Debug, Clone, Default)]
pub struct GroupedRoutes {
    /// Group → routes, both in discovery order
    pub mappings: IndexMap<ResourceGroup, Vec<RouteContext>>,
    /// One reference per group, in discovery order
    pub references: Vec<ListingReference>,
    /// Routes the strategy declined, as `METHODS path`
    pub ungrouped: Vec<String>,
}

/// Partitions routes into resource groups.
pub struct RouteGrouper<'a> {
    strategy: &'a dyn ResourceGroupingStrategy,
    path_provider: &'a dyn PathProvider,
}

impl<'a> RouteGrouper<'a> {
    pub fn new(
        strategy: &'a dyn ResourceGroupingStrategy,
        path_provider: &'a dyn PathProvider,
    ) -> Self {
        Self {
            strategy,
            path_provider,
        }
    }

    pub fn group(&self, routes: Vec<RouteContext>) -> GroupedRoutes {
        let mut grouped = GroupedRoutes::default();

        for route in routes {
            let Some(name) = self.strategy.group_name_for(&route) else {
                debug!(
                    "Route {} {} is not part of any resource group",
                    method_list(&route),
                    route.path
                );
                grouped.ungrouped.push(format!("{} {}", method_list(&route), route.path));
                continue;
            };

            let discovered = grouped.mappings.len();
            let position = self.strategy.position_for(&name).unwrap_or(discovered);
            let group = ResourceGroup::new(name, position);
            grouped.mappings.entry(group).or_default().push(route);
        }

        grouped.references = grouped
            .mappings
            .keys()
            .map(|group| ListingReference {
                name: group.name.clone(),
                path: self.path_provider.location_for(group),
                description: self.strategy.description_for(group),
                position: group.position,
            })
            .collect();

        debug!(
            "Grouped routes into {} resource groups ({} ungrouped)",
            grouped.references.len(),
            grouped.ungrouped.len()
        );
        grouped
    }
}

fn method_list(route: &RouteContext) -> String {
    route
        .effective_methods()
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
