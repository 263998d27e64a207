//! Feedback channel from callers to the liveness manager.

use crate::registry::domain::ServiceId;

/// Receives hints that a service may be unreachable.
///
/// Implementations must not block; the hint only asks for an earlier
/// liveness evaluation and never changes state by itself.
pub trait LivenessProbe: Send + Sync {
    /// Requests a prompt re-evaluation of `service_id`.
    fn expedite(&self, service_id: ServiceId);
}
