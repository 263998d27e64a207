//! Constraint satisfaction for a single intent pattern.

use crate::contract::domain::{IntentPattern, ParameterConstraint, ParameterType, ParameterValue};
use std::collections::BTreeMap;
use thiserror::Error;

/// First constraint a request failed for a pattern.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConstraintViolation {
    /// The pattern declares a literal the request binds differently.
    #[error("parameter '{parameter}' must equal {expected}")]
    LiteralMismatch {
        /// Parameter name.
        parameter: String,
        /// Literal declared by the pattern.
        expected: ParameterValue,
    },

    /// A required parameter is not bound.
    #[error("required parameter '{0}' is missing")]
    MissingRequired(String),

    /// The bound value has the wrong type.
    #[error("parameter '{parameter}' must be {expected}, got {actual}")]
    TypeMismatch {
        /// Parameter name.
        parameter: String,
        /// Declared type.
        expected: ParameterType,
        /// Type of the bound value.
        actual: &'static str,
    },

    /// The bound value is not one of the allowed members.
    #[error("parameter '{parameter}' value {value} is not an allowed value")]
    NotAllowed {
        /// Parameter name.
        parameter: String,
        /// Offending value.
        value: ParameterValue,
    },

    /// A range-constrained parameter is bound to a non-numeric value.
    #[error("parameter '{0}' must be numeric to satisfy its range")]
    NotNumeric(String),

    /// The bound number lies outside the declared range.
    #[error("parameter '{parameter}' value {value} is outside its range")]
    OutOfRange {
        /// Parameter name.
        parameter: String,
        /// Offending value.
        value: f64,
    },
}

/// Checks whether `bound` satisfies every rule of `pattern`.
///
/// Rules are applied in order: declared literals, required presence, then
/// each parameter constraint (type, enum membership, inclusive range). A
/// constrained parameter that is neither bound nor required passes.
///
/// # Errors
///
/// Returns the first [`ConstraintViolation`] encountered.
///
/// # Examples
///
/// ```
/// use intent_broker::contract::domain::{IntentPattern, ParameterConstraint, PatternConstraints};
/// use intent_broker::matching::domain::{IntentRequest, evaluate_pattern};
///
/// let pattern = IntentPattern::new("translate")
///     .with_placeholder("targetLanguage")
///     .with_constraints(
///         PatternConstraints::new()
///             .require(["targetLanguage"])
///             .constrain("targetLanguage", ParameterConstraint::one_of(["fr", "de"])),
///     );
///
/// let french = IntentRequest::new("translate").bind("targetLanguage", "fr");
/// assert!(evaluate_pattern(&pattern, &french.bound_parameters).is_ok());
///
/// let spanish = IntentRequest::new("translate").bind("targetLanguage", "es");
/// assert!(evaluate_pattern(&pattern, &spanish.bound_parameters).is_err());
/// ```
pub fn evaluate_pattern(
    pattern: &IntentPattern,
    bound: &BTreeMap<String, ParameterValue>,
) -> Result<(), ConstraintViolation> {
    check_literals(pattern, bound)?;

    if let Some(required) = pattern.required_parameters()
        && let Some(missing) = required.iter().find(|name| !bound.contains_key(*name))
    {
        return Err(ConstraintViolation::MissingRequired(missing.clone()));
    }

    for (parameter, constraint) in pattern.parameter_constraints() {
        if let Some(value) = bound.get(parameter) {
            check_value(parameter, constraint, value)?;
        }
    }
    Ok(())
}

fn check_literals(
    pattern: &IntentPattern,
    bound: &BTreeMap<String, ParameterValue>,
) -> Result<(), ConstraintViolation> {
    let mismatch = pattern
        .parameters
        .iter()
        .filter(|(_, declared)| declared.as_placeholder().is_none())
        .find(|(parameter, declared)| {
            bound
                .get(parameter.as_str())
                .is_some_and(|value| value != *declared)
        });

    match mismatch {
        Some((parameter, expected)) => Err(ConstraintViolation::LiteralMismatch {
            parameter: parameter.clone(),
            expected: expected.clone(),
        }),
        None => Ok(()),
    }
}

fn check_value(
    parameter: &str,
    constraint: &ParameterConstraint,
    value: &ParameterValue,
) -> Result<(), ConstraintViolation> {
    if let Some(expected) = constraint.value_type
        && !value.conforms_to(expected)
    {
        return Err(ConstraintViolation::TypeMismatch {
            parameter: parameter.to_owned(),
            expected,
            actual: value.type_name(),
        });
    }

    if let Some(members) = constraint.allowed_values.as_ref()
        && !members.contains(value)
    {
        return Err(ConstraintViolation::NotAllowed {
            parameter: parameter.to_owned(),
            value: value.clone(),
        });
    }

    if constraint.min.is_none() && constraint.max.is_none() {
        return Ok(());
    }
    let number = value
        .as_number()
        .ok_or_else(|| ConstraintViolation::NotNumeric(parameter.to_owned()))?;
    let below = constraint.min.is_some_and(|min| number < min);
    let above = constraint.max.is_some_and(|max| number > max);
    if below || above {
        return Err(ConstraintViolation::OutOfRange {
            parameter: parameter.to_owned(),
            value: number,
        });
    }
    Ok(())
}
