//! Settings that apply to every operation of a scan.

use crate::listing::ResponseMessage;
use crate::route::HttpMethod;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Framework plumbing types that are never documented as parameters.
const DEFAULT_IGNORABLE_TYPES: &[&str] = &[
    "HttpRequest",
    "Request",
    "State",
    "Extension",
    "HeaderMap",
    "Payload",
];

/// Missing fields deserialize to their [`Default`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalSettings {
    /// Parameter types dropped from operation descriptions
    pub ignorable_parameter_types: BTreeSet<String>,
    /// Response messages attached to operations that declare none of their own
    pub global_response_messages: BTreeMap<HttpMethod, Vec<ResponseMessage>>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            ignorable_parameter_types: DEFAULT_IGNORABLE_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            global_response_messages: BTreeMap::new(),
        }
    }
}

impl GlobalSettings {
    /// Settings with no ignorable types and no global response messages.
    pub fn empty() -> Self {
        Self {
            ignorable_parameter_types: BTreeSet::new(),
            global_response_messages: BTreeMap::new(),
        }
    }

    pub fn ignore_parameter_type(mut self, type_name: impl Into<String>) -> Self {
        self.ignorable_parameter_types.insert(type_name.into());
        self
    }

    pub fn with_response_messages(
        mut self,
        method: HttpMethod,
        messages: Vec<ResponseMessage>,
    ) -> Self {
        self.global_response_messages.insert(method, messages);
        self
    }

    pub fn is_ignorable(&self, type_name: &str) -> bool {
        self.ignorable_parameter_types.contains(type_name)
    }

    pub fn response_messages_for(&self, method: HttpMethod) -> &[ResponseMessage] {
        self.global_response_messages
            .get(&method)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
