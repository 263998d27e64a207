//! Intent requests.

use crate::contract::domain::ParameterValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A declarative request naming an action and its bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    /// Requested action.
    pub action: String,
    /// Parameters bound by the caller.
    #[serde(default)]
    pub bound_parameters: BTreeMap<String, ParameterValue>,
}

impl IntentRequest {
    /// Creates a request with no bound parameters.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            bound_parameters: BTreeMap::new(),
        }
    }

    /// Binds a parameter, replacing any previous binding.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.bound_parameters.insert(name.into(), value.into());
        self
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.bound_parameters.get(name)
    }
}
