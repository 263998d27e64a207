//! Tagged parameter values.

use super::ParameterType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamically bound parameter value.
///
/// Requests bind parameters by name to one of these variants, and patterns use
/// them both for literals and for enum members. Type checks are explicit via
/// [`ParameterValue::conforms_to`]; there is no implicit coercion between
/// variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// A boolean flag.
    Boolean(bool),
    /// A numeric value.
    Number(f64),
    /// A text value.
    String(String),
}

impl ParameterValue {
    /// Returns the name of the variant, matching [`ParameterType`] spelling.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }

    /// Returns the numeric value, if this is a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Boolean(_) | Self::String(_) => None,
        }
    }

    /// Returns the text value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            Self::Boolean(_) | Self::Number(_) => None,
        }
    }

    /// Returns the placeholder name when the value is `{name}` or `${name}`.
    ///
    /// Placeholders in pattern parameters accept any bound value; anything
    /// else is a literal.
    #[must_use]
    pub fn as_placeholder(&self) -> Option<&str> {
        let text = self.as_str()?.trim();
        let inner = text
            .strip_prefix("${")
            .or_else(|| text.strip_prefix('{'))?
            .strip_suffix('}')?
            .trim();
        (!inner.is_empty()).then_some(inner)
    }

    /// Returns whether the value has the declared type.
    ///
    /// `integer` accepts finite numbers without a fractional part.
    #[must_use]
    pub fn conforms_to(&self, declared: ParameterType) -> bool {
        match (declared, self) {
            (ParameterType::String, Self::String(_))
            | (ParameterType::Number, Self::Number(_))
            | (ParameterType::Boolean, Self::Boolean(_)) => true,
            (ParameterType::Integer, Self::Number(number)) => {
                number.is_finite() && number.fract() == 0.0
            }
            _ => false,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(flag) => write!(formatter, "{flag}"),
            Self::Number(number) => write!(formatter, "{number}"),
            Self::String(text) => formatter.write_str(text),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for ParameterValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
