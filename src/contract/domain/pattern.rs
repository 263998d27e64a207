//! Intent patterns and their parameter constraints.

use super::ParameterValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One intent shape a contract can serve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentPattern {
    /// Action identifier, matched exactly against a request's action.
    pub action: String,
    /// Declared parameters, each a placeholder or a literal.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
    /// Optional constraints over request parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<PatternConstraints>,
}

impl IntentPattern {
    /// Creates an unconstrained pattern with no declared parameters.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            parameters: BTreeMap::new(),
            constraints: None,
        }
    }

    /// Declares a placeholder parameter bound under its own name.
    #[must_use]
    pub fn with_placeholder(mut self, name: impl Into<String>) -> Self {
        let parameter = name.into();
        let placeholder = ParameterValue::String(format!("{{{parameter}}}"));
        self.parameters.insert(parameter, placeholder);
        self
    }

    /// Declares a literal parameter value.
    #[must_use]
    pub fn with_literal(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Replaces the constraints.
    #[must_use]
    pub fn with_constraints(mut self, constraints: PatternConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Returns the required parameter names of a constrained pattern.
    #[must_use]
    pub fn required_parameters(&self) -> Option<&BTreeSet<String>> {
        self.constraints
            .as_ref()
            .map(|constraints| &constraints.required_parameters)
    }

    /// Iterates the per-parameter constraints; empty when unconstrained.
    pub fn parameter_constraints(&self) -> impl Iterator<Item = (&String, &ParameterConstraint)> {
        self.constraints
            .iter()
            .flat_map(|constraints| constraints.parameter_constraints.iter())
    }

    /// Number of distinct parameters the pattern constrains.
    ///
    /// A parameter counts once whether it is required, has a value
    /// constraint, or both. Tighter contracts score higher.
    #[must_use]
    pub fn specificity(&self) -> usize {
        let Some(constraints) = self.constraints.as_ref() else {
            return 0;
        };
        constraints
            .required_parameters
            .iter()
            .chain(constraints.parameter_constraints.keys())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Required-presence and value constraints of a pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternConstraints {
    /// Parameters that must be bound in the request.
    #[serde(default)]
    pub required_parameters: BTreeSet<String>,
    /// Value constraints keyed by parameter name.
    #[serde(default)]
    pub parameter_constraints: BTreeMap<String, ParameterConstraint>,
}

impl PatternConstraints {
    /// Creates empty constraints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks parameters as required.
    #[must_use]
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_parameters
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds a value constraint for a parameter.
    #[must_use]
    pub fn constrain(mut self, name: impl Into<String>, constraint: ParameterConstraint) -> Self {
        self.parameter_constraints.insert(name.into(), constraint);
        self
    }
}

/// Value constraint for one parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterConstraint {
    /// Declared value type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ParameterType>,
    /// Allowed values; membership uses typed equality.
    #[serde(
        rename = "enum",
        alias = "enumValues",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub allowed_values: Option<Vec<ParameterValue>>,
    /// Inclusive numeric lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive numeric upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ParameterConstraint {
    /// Creates a constraint that only checks the value type.
    #[must_use]
    pub fn of_type(value_type: ParameterType) -> Self {
        Self {
            value_type: Some(value_type),
            ..Self::default()
        }
    }

    /// Creates a string constraint restricted to the given members.
    #[must_use]
    pub fn one_of<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value_type: Some(ParameterType::String),
            allowed_values: Some(
                members
                    .into_iter()
                    .map(|member| ParameterValue::String(member.into()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// Creates a numeric range constraint.
    #[must_use]
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            value_type: Some(ParameterType::Number),
            min,
            max,
            ..Self::default()
        }
    }
}

/// Declared parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// Any text.
    String,
    /// Any number.
    Number,
    /// A number with no fractional part.
    Integer,
    /// `true` or `false`.
    Boolean,
}

impl ParameterType {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
