//! Comparators that fix the order of listing references and of operations inside a listing.
//!
//! Both are applied with a stable sort, so elements a comparator considers equal keep their
//! discovery order. Any `Fn(&T, &T) -> Ordering` closure can stand in for either strategy.

use crate::grouping::ListingReference;
use crate::listing::OperationDescription;
use std::cmp::Ordering;

/// Orders listing references in the top-level resource listing.
pub trait ReferenceOrdering: Send + Sync {
    fn compare(&self, a: &ListingReference, b: &ListingReference) -> Ordering;
}

/// Orders operations within a group listing.
pub trait OperationOrdering: Send + Sync {
    fn compare(&self, a: &OperationDescription, b: &OperationDescription) -> Ordering;
}

impl<F> ReferenceOrdering for F
where
    F: Fn(&ListingReference, &ListingReference) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &ListingReference, b: &ListingReference) -> Ordering {
        self(a, b)
    }
}

impl<F> OperationOrdering for F
where
    F: Fn(&OperationDescription, &OperationDescription) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &OperationDescription, b: &OperationDescription) -> Ordering {
        self(a, b)
    }
}

/// Default reference ordering: by location, then by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicographicReferenceOrdering;

impl ReferenceOrdering for LexicographicReferenceOrdering {
    fn compare(&self, a: &ListingReference, b: &ListingReference) -> Ordering {
        a.path.cmp(&b.path).then_with(|| a.name.cmp(&b.name))
    }
}

/// Orders references by their declared position, then by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionReferenceOrdering;

impl ReferenceOrdering for PositionReferenceOrdering {
    fn compare(&self, a: &ListingReference, b: &ListingReference) -> Ordering {
        a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name))
    }
}

/// Default operation ordering: by path, then method name, then nickname.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicographicOperationOrdering;

impl OperationOrdering for LexicographicOperationOrdering {
    fn compare(&self, a: &OperationDescription, b: &OperationDescription) -> Ordering {
        a.path
            .cmp(&b.path)
            .then_with(|| a.method.as_str().cmp(b.method.as_str()))
            .then_with(|| a.nickname.cmp(&b.nickname))
    }
}

/// Orders operations by method name, then path, then nickname.
///
/// Reads like an HTTP verb index: every `GET` of a group before its `POST`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodThenPathOrdering;

impl OperationOrdering for MethodThenPathOrdering {
    fn compare(&self, a: &OperationDescription, b: &OperationDescription) -> Ordering {
        a.method
            .as_str()
            .cmp(b.method.as_str())
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.nickname.cmp(&b.nickname))
    }
}

/// Keeps operations in discovery order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationOrder;

impl OperationOrdering for DeclarationOrder {
    fn compare(&self, _a: &OperationDescription, _b: &OperationDescription) -> Ordering {
        Ordering::Equal
    }
}

pub fn sort_references(references: &mut [ListingReference], ordering: &dyn ReferenceOrdering) {
    references.sort_by(|a, b| ordering.compare(a, b));
}

pub fn sort_operations(operations: &mut [OperationDescription], ordering: &dyn OperationOrdering) {
    operations.sort_by(|a, b| ordering.compare(a, b));
}
