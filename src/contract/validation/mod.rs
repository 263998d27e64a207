//! Contract validation.
//!
//! [`validate_contract`] runs every rule in [`rules`] in a fixed order and
//! stops at the first violation. It has no side effects, so the registry can
//! call it before taking any lock.

pub mod rules;

use crate::contract::domain::{IntentContract, ValidationError};

/// Validates a submitted contract.
///
/// Checks, in order: schema version, kind, metadata name, presence of
/// patterns, each pattern's action, constraint references and numeric
/// ranges, and finally the endpoint.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
///
/// # Examples
///
/// ```
/// use intent_broker::contract::domain::{
///     ContractMetadata, ContractSpec, EndpointSpec, IntentContract, IntentPattern,
/// };
/// use intent_broker::contract::validation::validate_contract;
///
/// let contract = IntentContract::new(
///     ContractMetadata::named("nfa.examples.echo"),
///     ContractSpec::new(
///         vec![IntentPattern::new("echo")],
///         EndpointSpec::http("http://localhost:8080/echo"),
///     ),
/// );
///
/// assert!(validate_contract(&contract).is_ok());
/// ```
pub fn validate_contract(contract: &IntentContract) -> Result<(), ValidationError> {
    rules::validate_version(contract)?;
    rules::validate_kind(contract)?;
    rules::validate_name(&contract.metadata.name)?;
    rules::validate_patterns_present(contract)?;
    for (index, pattern) in contract.spec.intent_patterns.iter().enumerate() {
        rules::validate_action(pattern, index)?;
        rules::validate_constraint_references(pattern)?;
        rules::validate_ranges(pattern)?;
    }
    rules::validate_endpoint(contract)
}
