//! Individual contract validation rules.
//!
//! Each rule is a pure function over the submitted contract returning
//! `Ok(())` or the specific [`ValidationError`] it detected.

use crate::contract::domain::{
    CONTRACT_KIND, IntentContract, IntentPattern, SUPPORTED_VERSION, ValidationError,
};

/// Maximum length of a contract name, matching DNS-style dotted names.
const MAX_NAME_LENGTH: usize = 253;

/// Validates the schema version tag.
///
/// # Errors
///
/// Returns [`ValidationError::UnsupportedVersion`] for any other version.
pub fn validate_version(contract: &IntentContract) -> Result<(), ValidationError> {
    if contract.version != SUPPORTED_VERSION {
        return Err(ValidationError::UnsupportedVersion(contract.version.clone()));
    }
    Ok(())
}

/// Validates the document discriminator.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidKind`] for any other kind.
pub fn validate_kind(contract: &IntentContract) -> Result<(), ValidationError> {
    if contract.kind != CONTRACT_KIND {
        return Err(ValidationError::InvalidKind(contract.kind.clone()));
    }
    Ok(())
}

/// Validates the namespaced, dotted contract name.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyName`] for blank names and
/// [`ValidationError::InvalidName`] when any segment is malformed or the name
/// is too long.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }

    if name.len() > MAX_NAME_LENGTH || !name.split('.').all(is_valid_segment) {
        return Err(ValidationError::InvalidName(name.to_owned()));
    }

    Ok(())
}

fn is_valid_segment(segment: &str) -> bool {
    let mut characters = segment.chars();
    let Some(first) = characters.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && characters.all(|character| {
            character.is_ascii_alphanumeric() || character == '-' || character == '_'
        })
}

/// Validates that at least one pattern is declared.
///
/// # Errors
///
/// Returns [`ValidationError::NoIntentPatterns`] for an empty pattern list.
pub fn validate_patterns_present(contract: &IntentContract) -> Result<(), ValidationError> {
    if contract.spec.intent_patterns.is_empty() {
        return Err(ValidationError::NoIntentPatterns);
    }
    Ok(())
}

/// Validates that a pattern's action is non-empty.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyAction`] with the pattern's position.
pub fn validate_action(pattern: &IntentPattern, index: usize) -> Result<(), ValidationError> {
    if pattern.action.trim().is_empty() {
        return Err(ValidationError::EmptyAction { index });
    }
    Ok(())
}

/// Validates that every value constraint refers to a declared parameter.
///
/// # Errors
///
/// Returns [`ValidationError::UndeclaredConstrainedParameter`] for the first
/// constraint whose parameter is missing from `parameters`.
pub fn validate_constraint_references(pattern: &IntentPattern) -> Result<(), ValidationError> {
    match pattern
        .parameter_constraints()
        .find(|(name, _)| !pattern.parameters.contains_key(*name))
    {
        Some((name, _)) => Err(ValidationError::UndeclaredConstrainedParameter {
            action: pattern.action.clone(),
            parameter: name.clone(),
        }),
        None => Ok(()),
    }
}

/// Validates that declared numeric ranges are finite and not inverted.
///
/// # Errors
///
/// Returns [`ValidationError::NonFiniteBound`] when either bound is NaN or
/// infinite, and [`ValidationError::InvertedRange`] when both bounds are
/// present and `min > max`.
pub fn validate_ranges(pattern: &IntentPattern) -> Result<(), ValidationError> {
    for (name, constraint) in pattern.parameter_constraints() {
        if let Some(bound) = [constraint.min, constraint.max]
            .into_iter()
            .flatten()
            .find(|bound| !bound.is_finite())
        {
            return Err(ValidationError::NonFiniteBound {
                action: pattern.action.clone(),
                parameter: name.clone(),
                bound,
            });
        }
        if let (Some(min), Some(max)) = (constraint.min, constraint.max)
            && min > max
        {
            return Err(ValidationError::InvertedRange {
                action: pattern.action.clone(),
                parameter: name.clone(),
                min,
                max,
            });
        }
    }
    Ok(())
}

/// Validates the implementation endpoint.
///
/// # Errors
///
/// Returns the endpoint errors described on
/// [`EndpointSpec::resolve`](crate::contract::domain::EndpointSpec::resolve).
pub fn validate_endpoint(contract: &IntentContract) -> Result<(), ValidationError> {
    contract.spec.implementation.endpoint.resolve().map(|_| ())
}
