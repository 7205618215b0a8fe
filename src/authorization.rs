//! Authorization schemes declared by the API and the requirements attached to operations.
//!
//! Schemes ([`AuthorizationType`]) appear once in the top-level resource listing. Requirements
//! ([`AuthorizationRequirement`]) are attached per operation by an
//! [`AuthorizationContextProvider`]; having no provider, or no matching rule, simply means the
//! operation declares no authorization.

use crate::error::{Error, Result};
use crate::route::HttpMethod;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// An authorization scheme declared by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthorizationType {
    #[serde(rename_all = "camelCase")]
    ApiKey {
        name: String,
        /// Name of the header or query parameter carrying the key
        key_name: String,
        /// `header` or `query`
        pass_as: String,
    },
    BasicAuth { name: String },
    #[serde(rename_all = "camelCase")]
    Oauth2 {
        name: String,
        #[serde(default)]
        scopes: Vec<AuthorizationScope>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorization_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_url: Option<String>,
    },
}

impl AuthorizationType {
    pub fn name(&self) -> &str {
        match self {
            AuthorizationType::ApiKey { name, .. } => name,
            AuthorizationType::BasicAuth { name } => name,
            AuthorizationType::Oauth2 { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationScope {
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AuthorizationScope {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            description: None,
        }
    }
}

/// One scheme an operation requires, with the scopes it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequirement {
    /// Name of a declared [`AuthorizationType`]
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<AuthorizationScope>,
}

impl AuthorizationRequirement {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            scopes: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(AuthorizationScope::new(scope));
        self
    }
}

/// Supplies the authorization requirements of an operation.
pub trait AuthorizationContextProvider: Send + Sync {
    /// Requirements for `method path`; an empty list means none are declared.
    fn authorizations_for(&self, path: &str, method: HttpMethod) -> Vec<AuthorizationRequirement>;
}

impl<F> AuthorizationContextProvider for F
where
    F: Fn(&str, HttpMethod) -> Vec<AuthorizationRequirement> + Send + Sync,
{
    fn authorizations_for(&self, path: &str, method: HttpMethod) -> Vec<AuthorizationRequirement> {
        self(path, method)
    }
}

/// Applies requirements to operations whose path matches a regular expression.
#[derive(Debug, Clone)]
pub struct AuthorizationRule {
    selector: Regex,
    /// Restricts the rule to these methods; empty means all methods
    methods: Vec<HttpMethod>,
    requirements: Vec<AuthorizationRequirement>,
}

impl AuthorizationRule {
    pub fn new(
        path_pattern: &str,
        methods: Vec<HttpMethod>,
        requirements: Vec<AuthorizationRequirement>,
    ) -> Result<Self> {
        let selector = Regex::new(path_pattern).map_err(|e| {
            Error::InvalidConfiguration(format!(
                "invalid authorization path pattern '{}': {}",
                path_pattern, e
            ))
        })?;
        Ok(Self {
            selector,
            methods,
            requirements,
        })
    }

    fn matches(&self, path: &str, method: HttpMethod) -> bool {
        (self.methods.is_empty() || self.methods.contains(&method)) && self.selector.is_match(path)
    }
}

/// Rule-based provider; the first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationContext {
    rules: Vec<AuthorizationRule>,
}

impl AuthorizationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: AuthorizationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl AuthorizationContextProvider for AuthorizationContext {
    fn authorizations_for(&self, path: &str, method: HttpMethod) -> Vec<AuthorizationRequirement> {
        match self.rules.iter().find(|rule| rule.matches(path, method)) {
            Some(rule) => {
                debug!("Authorization rule '{}' applies to {} {}", rule.selector, method, path);
                rule.requirements.clone()
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> AuthorizationContext {
        AuthorizationContext::new()
            .with_rule(
                AuthorizationRule::new(
                    "^/pets",
                    vec![HttpMethod::Post, HttpMethod::Delete],
                    vec![AuthorizationRequirement::new("oauth2").with_scope("write:pets")],
                )
                .unwrap(),
            )
            .with_rule(
                AuthorizationRule::new(
                    "^/admin",
                    vec![],
                    vec![AuthorizationRequirement::new("api_key")],
                )
                .unwrap(),
            )
    }

    #[test]
    fn test_matching_rule_applies() {
        let requirements = context().authorizations_for("/pets/{id}", HttpMethod::Delete);
        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements[0].type_name, "oauth2");
        assert_eq!(requirements[0].scopes[0].scope, "write:pets");
    }

    #[test]
    fn test_method_restriction() {
        assert!(context().authorizations_for("/pets", HttpMethod::Get).is_empty());
    }

    #[test]
    fn test_rule_without_methods_matches_all() {
        let requirements = context().authorizations_for("/admin/users", HttpMethod::Get);
        assert_eq!(requirements[0].type_name, "api_key");
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(context().authorizations_for("/stores", HttpMethod::Get).is_empty());
        assert!(AuthorizationContext::new()
            .authorizations_for("/pets", HttpMethod::Get)
            .is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_configuration_error() {
        let err = AuthorizationRule::new("(", vec![], vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_closure_provider() {
        let provider = |path: &str, _method: HttpMethod| {
            if path.starts_with("/secure") {
                vec![AuthorizationRequirement::new("basic")]
            } else {
                vec![]
            }
        };
        assert_eq!(provider.authorizations_for("/secure/x", HttpMethod::Get).len(), 1);
        assert!(provider.authorizations_for("/open", HttpMethod::Get).is_empty());
    }

    #[test]
    fn test_authorization_type_serialization() {
        let scheme = AuthorizationType::ApiKey {
            name: "api_key".to_string(),
            key_name: "X-Api-Key".to_string(),
            pass_as: "header".to_string(),
        };
        let json = serde_json::to_value(&scheme).unwrap();
        assert_eq!(json["type"], "apiKey");
        assert_eq!(json["keyName"], "X-Api-Key");
        assert_eq!(json["passAs"], "header");
        assert_eq!(scheme.name(), "api_key");
    }
}
