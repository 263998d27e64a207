//! Per-service invocation state: in-flight leases and latency windows.

use crate::invocation::domain::{DEFAULT_LATENCY_WINDOW, LatencySnapshot, RollingLatency};
use crate::registry::{
    domain::ServiceId,
    ports::{RemovalListener, RemovalReason},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Concurrent invocations allowed per service unless configured otherwise.
pub const DEFAULT_MAX_INFLIGHT_PER_SERVICE: usize = 64;

/// Lease pools and latency windows keyed by service.
///
/// Entries are created lazily on first invocation and dropped when the
/// registry reports the service removed, whether by deregistration,
/// supersession, or eviction.
#[derive(Debug)]
pub struct InvocationLedger {
    max_inflight: usize,
    latency_window: usize,
    leases: Mutex<HashMap<ServiceId, Arc<Semaphore>>>,
    latency: RwLock<HashMap<ServiceId, RollingLatency>>,
}

impl Default for InvocationLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InvocationLedger {
    /// Creates a ledger with default in-flight and latency window limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_inflight: DEFAULT_MAX_INFLIGHT_PER_SERVICE,
            latency_window: DEFAULT_LATENCY_WINDOW,
            leases: Mutex::new(HashMap::new()),
            latency: RwLock::new(HashMap::new()),
        }
    }

    /// Overrides the per-service in-flight limit; zero is treated as one.
    #[must_use]
    pub fn with_max_inflight(mut self, max_inflight: usize) -> Self {
        self.max_inflight = max_inflight.max(1);
        self
    }

    /// Overrides the number of latency samples kept per service.
    #[must_use]
    pub fn with_latency_window(mut self, latency_window: usize) -> Self {
        self.latency_window = latency_window;
        self
    }

    /// Returns the latency summary for a service, if it has been invoked.
    #[must_use]
    pub fn latency(&self, service_id: ServiceId) -> Option<LatencySnapshot> {
        let latency = self.latency.read().ok()?;
        latency.get(&service_id)?.snapshot()
    }

    /// Returns how many invocations of `service_id` are in flight.
    #[must_use]
    pub fn inflight(&self, service_id: ServiceId) -> usize {
        self.leases
            .lock()
            .ok()
            .and_then(|leases| {
                leases
                    .get(&service_id)
                    .map(|semaphore| self.max_inflight.saturating_sub(semaphore.available_permits()))
            })
            .unwrap_or_default()
    }

    /// Returns whether any lease pool or latency window exists for `service_id`.
    #[must_use]
    pub fn tracks(&self, service_id: ServiceId) -> bool {
        let leased = self
            .leases
            .lock()
            .is_ok_and(|leases| leases.contains_key(&service_id));
        let timed = self
            .latency
            .read()
            .is_ok_and(|latency| latency.contains_key(&service_id));
        leased || timed
    }

    /// Drops the lease pool and latency window of a removed service.
    ///
    /// Calls already holding a lease keep it until they finish.
    pub fn forget(&self, service_id: ServiceId) {
        if let Ok(mut leases) = self.leases.lock() {
            leases.remove(&service_id);
        }
        if let Ok(mut latency) = self.latency.write() {
            latency.remove(&service_id);
        }
    }

    pub(crate) async fn acquire_lease(
        &self,
        service_id: ServiceId,
    ) -> Result<OwnedSemaphorePermit, String> {
        let semaphore = {
            let mut leases = self.leases.lock().map_err(|err| err.to_string())?;
            Arc::clone(
                leases
                    .entry(service_id)
                    .or_insert_with(|| Arc::new(Semaphore::new(self.max_inflight))),
            )
        };
        semaphore.acquire_owned().await.map_err(|err| err.to_string())
    }

    pub(crate) fn record_latency(&self, service_id: ServiceId, sample: Duration) {
        match self.latency.write() {
            Ok(mut latency) => latency
                .entry(service_id)
                .or_insert_with(|| RollingLatency::new(self.latency_window))
                .record(sample),
            Err(err) => tracing::warn!(error = %err, "latency table lock poisoned"),
        }
    }
}

impl RemovalListener for InvocationLedger {
    fn service_removed(&self, service_id: ServiceId, reason: RemovalReason) {
        tracing::debug!(
            service_id = %service_id,
            reason = ?reason,
            "dropping invocation state of removed service"
        );
        self.forget(service_id);
    }
}
