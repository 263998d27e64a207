//! Caller-facing error taxonomy.

use crate::contract::domain::ValidationError;
use crate::invocation::services::InvocationError;
use crate::matching::services::MatchError;
use crate::registry::{
    domain::ServiceId,
    ports::RegistryError,
    services::{LivenessServiceError, RegistryServiceError},
};
use serde_json::Value;
use thiserror::Error;

/// Errors returned by [`super::IntentBroker`] operations.
///
/// Every variant is scoped to the failing operation; none of them affects
/// other registrations, matches, or invocations.
#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    /// The contract was rejected before any registry mutation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The registry could not complete the operation; safe to retry.
    #[error("registration failed: {0}")]
    Registration(RegistryError),

    /// The identifier is no longer registered.
    #[error("service {0} not found")]
    NotFound(ServiceId),

    /// No registration satisfied the request.
    #[error("no service matches action '{action}'")]
    NoMatch {
        /// Requested action.
        action: String,
    },

    /// The endpoint did not reply in time or could not be reached.
    #[error("service {service_id} is unreachable: {reason}")]
    Unreachable {
        /// Target service.
        service_id: ServiceId,
        /// Failure description.
        reason: String,
    },

    /// The invoked service returned an application error.
    #[error("service {service_id} returned an error: {body}")]
    RemoteError {
        /// Target service.
        service_id: ServiceId,
        /// Error body exactly as returned.
        body: Value,
    },
}

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

impl From<RegistryError> for BrokerError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(service_id) => Self::NotFound(service_id),
            other => Self::Registration(other),
        }
    }
}

impl From<RegistryServiceError> for BrokerError {
    fn from(err: RegistryServiceError) -> Self {
        match err {
            RegistryServiceError::Validation(validation) => Self::Validation(validation),
            RegistryServiceError::Repository(repository) => repository.into(),
            RegistryServiceError::NotFound(service_id) => Self::NotFound(service_id),
        }
    }
}

impl From<LivenessServiceError> for BrokerError {
    fn from(err: LivenessServiceError) -> Self {
        match err {
            LivenessServiceError::Repository(repository) => repository.into(),
            LivenessServiceError::NotFound(service_id) => Self::NotFound(service_id),
        }
    }
}

impl From<MatchError> for BrokerError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::NoMatch { action } => Self::NoMatch { action },
            MatchError::Repository(repository) => repository.into(),
        }
    }
}

impl From<InvocationError> for BrokerError {
    fn from(err: InvocationError) -> Self {
        match err {
            InvocationError::Unreachable { service_id, reason } => {
                Self::Unreachable { service_id, reason }
            }
            InvocationError::RemoteError { service_id, body } => {
                Self::RemoteError { service_id, body }
            }
        }
    }
}
