//! Notifications about registrations leaving the registry.

use crate::registry::domain::ServiceId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Why a registration left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Removed by an explicit deregistration.
    Deregistered,
    /// Replaced by a newer registration with the same contract name.
    Superseded,
    /// Removed by the liveness sweep.
    Evicted,
}

/// Receives every removal from the registry, whatever its cause.
///
/// Callbacks run on the removing task after the registry mutation has
/// committed, so they must not block.
pub trait RemovalListener: Send + Sync {
    /// Called once for each registration that left the registry.
    fn service_removed(&self, service_id: ServiceId, reason: RemovalReason);
}

/// Fans a removal out to every listener.
pub(crate) fn notify_removal(
    listeners: &[Arc<dyn RemovalListener>],
    service_id: ServiceId,
    reason: RemovalReason,
) {
    for listener in listeners {
        listener.service_removed(service_id, reason);
    }
}
