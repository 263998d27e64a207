//! Contract validation errors.

use thiserror::Error;

/// Reasons a submitted contract is rejected before it reaches the registry.
///
/// Validation is fail-fast, so a rejected contract reports only the first
/// violation found. All variants are recoverable by resubmitting a corrected
/// contract.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// The schema version is not the supported one.
    #[error("unsupported contract version '{0}' (expected 'v1alpha')")]
    UnsupportedVersion(String),

    /// The document discriminator is not `IntentContract`.
    #[error("invalid contract kind '{0}' (expected 'IntentContract')")]
    InvalidKind(String),

    /// `metadata.name` is empty after trimming.
    #[error("contract metadata name must not be empty")]
    EmptyName,

    /// `metadata.name` is not a dotted identifier.
    #[error(
        "contract name '{0}' must be dot-separated segments of letters, digits, '-' or '_', each starting with a letter"
    )]
    InvalidName(String),

    /// The contract declares no intent patterns.
    #[error("contract must declare at least one intent pattern")]
    NoIntentPatterns,

    /// A pattern has an empty action.
    #[error("intent pattern {index} has an empty action")]
    EmptyAction {
        /// Zero-based pattern position.
        index: usize,
    },

    /// A constraint refers to a parameter the pattern does not declare.
    #[error("pattern '{action}' constrains undeclared parameter '{parameter}'")]
    UndeclaredConstrainedParameter {
        /// Action of the offending pattern.
        action: String,
        /// Constrained parameter name.
        parameter: String,
    },

    /// A numeric range has `min > max`.
    #[error("pattern '{action}' parameter '{parameter}' has min {min} greater than max {max}")]
    InvertedRange {
        /// Action of the offending pattern.
        action: String,
        /// Constrained parameter name.
        parameter: String,
        /// Declared lower bound.
        min: f64,
        /// Declared upper bound.
        max: f64,
    },

    /// A numeric range bound is NaN or infinite.
    #[error("pattern '{action}' parameter '{parameter}' has non-finite bound {bound}")]
    NonFiniteBound {
        /// Action of the offending pattern.
        action: String,
        /// Constrained parameter name.
        parameter: String,
        /// The offending bound.
        bound: f64,
    },

    /// The endpoint transport is not supported.
    #[error("unsupported endpoint type '{0}' (expected 'grpc' or 'http')")]
    UnsupportedEndpointType(String),

    /// The endpoint lacks a field its transport requires.
    #[error("{transport} endpoint requires field '{field}'")]
    MissingEndpointField {
        /// Declared transport kind.
        transport: String,
        /// Missing field name.
        field: String,
    },

    /// The endpoint port is outside `1..=65535`.
    #[error("endpoint port {0} is out of range")]
    InvalidEndpointPort(u32),

    /// The endpoint URL is not an HTTP(S) URL.
    #[error("endpoint url '{0}' must start with 'http://' or 'https://'")]
    InvalidEndpointUrl(String),
}

impl ValidationError {
    /// Builds a [`ValidationError::MissingEndpointField`].
    #[must_use]
    pub fn missing_endpoint_field(transport: &str, field: &str) -> Self {
        Self::MissingEndpointField {
            transport: transport.to_owned(),
            field: field.to_owned(),
        }
    }
}
