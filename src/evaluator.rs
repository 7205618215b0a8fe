//! Route evaluator policies decide which routes are documented at all.
//!
//! The listing expander consults the evaluator before doing any model or authorization work, so
//! a rejected route costs nothing beyond the predicate call.

use crate::route::{normalize_path, RouteContext};

/// Predicate over routes; rejected routes never reach a group listing.
pub trait RouteEvaluator: Send + Sync {
    fn accepts(&self, route: &RouteContext) -> bool;
}

impl<F> RouteEvaluator for F
where
    F: Fn(&RouteContext) -> bool + Send + Sync,
{
    fn accepts(&self, route: &RouteContext) -> bool {
        self(route)
    }
}

/// Accepts every route.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl RouteEvaluator for AcceptAll {
    fn accepts(&self, _route: &RouteContext) -> bool {
        true
    }
}

/// Rejects routes living under any of the given path prefixes.
///
/// Prefixes match whole segments: `/admin` rejects `/admin` and `/admin/users`, not
/// `/administrators`.
#[derive(Debug, Clone, Default)]
pub struct ExcludePathPrefixes {
    prefixes: Vec<String>,
}

impl ExcludePathPrefixes {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| normalize_path(p.into().trim_end_matches('/')))
                .collect(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.prefixes.iter().any(|prefix| {
            prefix.is_empty()
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

impl RouteEvaluator for ExcludePathPrefixes {
    fn accepts(&self, route: &RouteContext) -> bool {
        !self.matches(&route.path)
    }
}
