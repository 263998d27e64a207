//! Intent contract document types.

use super::{EndpointSpec, IntentPattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The only contract schema version this broker accepts.
pub const SUPPORTED_VERSION: &str = "v1alpha";

/// Expected value of the contract `kind` discriminator.
pub const CONTRACT_KIND: &str = "IntentContract";

/// Declarative description of the intents a service can handle.
///
/// New submissions replace earlier ones; a registered contract is never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentContract {
    /// Schema version tag.
    pub version: String,
    /// Document discriminator.
    pub kind: String,
    /// Ownership and labelling metadata.
    pub metadata: ContractMetadata,
    /// Intent patterns, implementation endpoint, and QoS hints.
    pub spec: ContractSpec,
}

impl IntentContract {
    /// Creates a contract with the supported version and kind.
    #[must_use]
    pub fn new(metadata: ContractMetadata, spec: ContractSpec) -> Self {
        Self {
            version: SUPPORTED_VERSION.to_owned(),
            kind: CONTRACT_KIND.to_owned(),
            metadata,
            spec,
        }
    }

    /// Returns the owning capability name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Returns the declared QoS priority, defaulting to
    /// [`QosPriority::Normal`].
    #[must_use]
    pub fn priority(&self) -> QosPriority {
        self.spec
            .qos
            .as_ref()
            .and_then(|qos| qos.priority)
            .unwrap_or_default()
    }

    /// Returns the distinct actions declared across all patterns, in
    /// declaration order.
    #[must_use]
    pub fn actions(&self) -> Vec<&str> {
        let mut actions: Vec<&str> = Vec::with_capacity(self.spec.intent_patterns.len());
        for pattern in &self.spec.intent_patterns {
            if !actions.contains(&pattern.action.as_str()) {
                actions.push(pattern.action.as_str());
            }
        }
        actions
    }
}

/// Contract metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMetadata {
    /// Globally unique, dotted capability name.
    pub name: String,
    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unordered string labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl ContractMetadata {
    /// Creates metadata with the given name and no labels.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body of an intent contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSpec {
    /// Ordered intent patterns; declaration order breaks ties.
    pub intent_patterns: Vec<IntentPattern>,
    /// How to reach the implementing service.
    pub implementation: Implementation,
    /// Optional quality-of-service hints used only for tie-breaking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qos: Option<QualityOfService>,
}

impl ContractSpec {
    /// Creates a spec with the given patterns and endpoint.
    #[must_use]
    pub fn new(intent_patterns: Vec<IntentPattern>, endpoint: EndpointSpec) -> Self {
        Self {
            intent_patterns,
            implementation: Implementation {
                endpoint,
                resources: Vec::new(),
            },
            qos: None,
        }
    }

    /// Sets the QoS hints.
    #[must_use]
    pub fn with_qos(mut self, qos: QualityOfService) -> Self {
        self.qos = Some(qos);
        self
    }
}

/// Implementation details of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    /// Transport endpoint of the service.
    pub endpoint: EndpointSpec,
    /// Resource hints carried for operators; not used for matching.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceRequirement>,
}

/// A resource the implementation expects to have available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirement {
    /// Resource category, such as `cpu` or `accelerator`.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Amount in free-form units.
    pub units: String,
    /// Optional sub-kind, such as an accelerator model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Quality-of-service hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityOfService {
    /// Advertised latency, free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<String>,
    /// Advertised availability, free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    /// Declared priority; higher wins ties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<QosPriority>,
}

impl QualityOfService {
    /// Creates QoS hints carrying only a priority.
    #[must_use]
    pub const fn with_priority(priority: QosPriority) -> Self {
        Self {
            latency: None,
            availability: None,
            priority: Some(priority),
        }
    }
}

/// Declared contract priority. Ordering is ascending, so `Critical` is the
/// greatest value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QosPriority {
    /// Lowest priority.
    Low,
    /// Default priority.
    #[default]
    Normal,
    /// Preferred over normal contracts.
    High,
    /// Preferred over every other priority.
    Critical,
}

impl QosPriority {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for QosPriority {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
