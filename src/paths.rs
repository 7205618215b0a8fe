//! Path providers compute where each resource listing lives and which base paths the document
//! advertises.

use crate::grouping::ResourceGroup;

/// Base path under which resource listings are served when no other is configured.
pub const DOCUMENTATION_BASE_PATH: &str = "/api-docs";

/// Computes listing locations and base paths.
pub trait PathProvider: Send + Sync {
    /// Location of a group's listing, relative to [`PathProvider::documentation_base_path`].
    fn location_for(&self, group: &ResourceGroup) -> String;

    /// Prefix under which listings are served.
    fn documentation_base_path(&self) -> String {
        DOCUMENTATION_BASE_PATH.to_string()
    }

    /// Base path of the documented application itself, placed in each group listing.
    fn application_base_path(&self) -> String;
}

/// Serves everything relative to the application root.
#[derive(Debug, Clone)]
pub struct RelativePathProvider {
    documentation_base_path: String,
    application_base_path: String,
}

impl RelativePathProvider {
    pub fn new() -> Self {
        Self {
            documentation_base_path: DOCUMENTATION_BASE_PATH.to_string(),
            application_base_path: "/".to_string(),
        }
    }

    pub fn with_documentation_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.documentation_base_path = base_path.into();
        self
    }

    pub fn with_application_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.application_base_path = base_path.into();
        self
    }
}

impl Default for RelativePathProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PathProvider for RelativePathProvider {
    fn location_for(&self, group: &ResourceGroup) -> String {
        format!("/{}", group.name)
    }

    fn documentation_base_path(&self) -> String {
        self.documentation_base_path.clone()
    }

    fn application_base_path(&self) -> String {
        self.application_base_path.clone()
    }
}

/// Advertises fully qualified base paths, e.g. `https://api.example.com/v1`.
#[derive(Debug, Clone)]
pub struct AbsolutePathProvider {
    host: String,
    context_path: String,
}

impl AbsolutePathProvider {
    /// `host` is scheme-qualified (`https://api.example.com`); `context_path` may be empty.
    pub fn new(host: impl Into<String>, context_path: impl Into<String>) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            context_path: context_path.into(),
        }
    }

    fn join(&self, suffix: &str) -> String {
        let context = self.context_path.trim_matches('/');
        let suffix = suffix.trim_matches('/');
        [self.host.as_str(), context, suffix]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl PathProvider for AbsolutePathProvider {
    fn location_for(&self, group: &ResourceGroup) -> String {
        format!("/{}", group.name)
    }

    fn documentation_base_path(&self) -> String {
        self.join(DOCUMENTATION_BASE_PATH)
    }

    fn application_base_path(&self) -> String {
        self.join("")
    }
}
