//! Invocation targets.

use crate::contract::domain::Endpoint;
use crate::matching::domain::MatchResult;
use crate::registry::domain::{ServiceId, ServiceRegistration};
use serde::{Deserialize, Serialize};

/// The service and endpoint an invocation is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationTarget {
    /// Owning registration.
    pub service_id: ServiceId,
    /// Endpoint receiving the payload.
    pub endpoint: Endpoint,
}

impl InvocationTarget {
    /// Creates a target.
    #[must_use]
    pub const fn new(service_id: ServiceId, endpoint: Endpoint) -> Self {
        Self {
            service_id,
            endpoint,
        }
    }
}

impl From<&ServiceRegistration> for InvocationTarget {
    fn from(registration: &ServiceRegistration) -> Self {
        Self::new(registration.id(), registration.endpoint().clone())
    }
}

impl From<MatchResult> for InvocationTarget {
    fn from(result: MatchResult) -> Self {
        Self::new(result.service_id, result.endpoint)
    }
}
