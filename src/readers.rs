//! Custom mapping readers run after an operation has been described and may enrich it or veto it.
//!
//! Readers run in configured order. A veto is final: later readers are skipped and the
//! operation is left out of the listing. A reader returning `Err` fails the whole group it
//! belongs to, which the scan then reports as a per-group failure.

use crate::error::Result;
use crate::listing::OperationDescription;
use crate::route::RouteContext;

/// What a reader decided about an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderOutcome {
    /// Keep the operation, possibly enriched
    Keep(OperationDescription),
    /// Exclude the operation from the listing
    Veto,
}

pub trait MappingReader: Send + Sync {
    /// Name used in logs and error reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn enrich_or_veto(
        &self,
        operation: OperationDescription,
        route: &RouteContext,
    ) -> Result<ReaderOutcome>;
}

impl<F> MappingReader for F
where
    F: Fn(OperationDescription, &RouteContext) -> Result<ReaderOutcome> + Send + Sync,
{
    fn enrich_or_veto(
        &self,
        operation: OperationDescription,
        route: &RouteContext,
    ) -> Result<ReaderOutcome> {
        self(operation, route)
    }
}

/// Vetoes routes flagged as hidden.
#[derive(Debug, Clone, Copy, Default)]
pub struct HiddenRouteReader;

impl MappingReader for HiddenRouteReader {
    fn name(&self) -> &str {
        "hidden-routes"
    }

    fn enrich_or_veto(
        &self,
        operation: OperationDescription,
        route: &RouteContext,
    ) -> Result<ReaderOutcome> {
        if route.hidden {
            return Ok(ReaderOutcome::Veto);
        }
        Ok(ReaderOutcome::Keep(operation))
    }
}

/// Marks operations of deprecated routes and notes it in their notes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeprecationReader;

impl MappingReader for DeprecationReader {
    fn name(&self) -> &str {
        "deprecation"
    }

    fn enrich_or_veto(
        &self,
        mut operation: OperationDescription,
        route: &RouteContext,
    ) -> Result<ReaderOutcome> {
        if route.deprecated {
            operation.deprecated = true;
            let notes = operation.notes.take().unwrap_or_default();
            operation.notes = Some(if notes.is_empty() {
                "Deprecated.".to_string()
            } else {
                format!("Deprecated. {}", notes)
            });
        }
        Ok(ReaderOutcome::Keep(operation))
    }
}

/// Fills in media types for operations that declare none.
#[derive(Debug, Clone)]
pub struct DefaultMediaTypesReader {
    produces: Vec<String>,
    consumes: Vec<String>,
}

impl DefaultMediaTypesReader {
    pub fn new(produces: Vec<String>, consumes: Vec<String>) -> Self {
        Self { produces, consumes }
    }

    pub fn json() -> Self {
        Self::new(vec!["application/json".to_string()], vec!["application/json".to_string()])
    }
}

impl MappingReader for DefaultMediaTypesReader {
    fn name(&self) -> &str {
        "default-media-types"
    }

    fn enrich_or_veto(
        &self,
        mut operation: OperationDescription,
        _route: &RouteContext,
    ) -> Result<ReaderOutcome> {
        if operation.produces.is_empty() {
            operation.produces = self.produces.clone();
        }
        if operation.consumes.is_empty() && operation.has_body() {
            operation.consumes = self.consumes.clone();
        }
        Ok(ReaderOutcome::Keep(operation))
    }
}
