//! Broker-level counters and request timing.

use super::BrokerError;
use crate::invocation::domain::{LatencySnapshot, RollingLatency};
use crate::registry::{
    domain::ServiceId,
    ports::{RemovalListener, RemovalReason},
};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Monotonic counters for one broker instance.
///
/// Counters only ever increase. Removals arrive through
/// [`RemovalListener`], so evictions made by the background sweep are
/// counted alongside explicit deregistrations.
#[derive(Debug)]
pub struct BrokerMetrics {
    registrations: AtomicU64,
    deregistrations: AtomicU64,
    supersessions: AtomicU64,
    evictions: AtomicU64,
    heartbeats: AtomicU64,
    resolve_requests: AtomicU64,
    invoke_requests: AtomicU64,
    errors: ErrorCounters,
    request_duration: Mutex<RollingLatency>,
}

#[derive(Debug, Default)]
struct ErrorCounters {
    validation: AtomicU64,
    registration: AtomicU64,
    not_found: AtomicU64,
    no_match: AtomicU64,
    unreachable: AtomicU64,
    remote_error: AtomicU64,
}

impl ErrorCounters {
    const fn counter(&self, error: &BrokerError) -> &AtomicU64 {
        match error {
            BrokerError::Validation(_) => &self.validation,
            BrokerError::Registration(_) => &self.registration,
            BrokerError::NotFound(_) => &self.not_found,
            BrokerError::NoMatch { .. } => &self.no_match,
            BrokerError::Unreachable { .. } => &self.unreachable,
            BrokerError::RemoteError { .. } => &self.remote_error,
        }
    }

    fn snapshot(&self) -> ErrorCounts {
        ErrorCounts {
            validation: read(&self.validation),
            registration: read(&self.registration),
            not_found: read(&self.not_found),
            no_match: read(&self.no_match),
            unreachable: read(&self.unreachable),
            remote_error: read(&self.remote_error),
        }
    }
}

impl BrokerMetrics {
    /// Creates zeroed counters keeping `latency_window` request durations.
    #[must_use]
    pub fn new(latency_window: usize) -> Self {
        Self {
            registrations: AtomicU64::new(0),
            deregistrations: AtomicU64::new(0),
            supersessions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            heartbeats: AtomicU64::new(0),
            resolve_requests: AtomicU64::new(0),
            invoke_requests: AtomicU64::new(0),
            errors: ErrorCounters::default(),
            request_duration: Mutex::new(RollingLatency::new(latency_window)),
        }
    }

    pub(crate) fn record_registration(&self) {
        bump(&self.registrations);
    }

    pub(crate) fn record_heartbeat(&self) {
        bump(&self.heartbeats);
    }

    pub(crate) fn record_resolve(&self) {
        bump(&self.resolve_requests);
    }

    pub(crate) fn record_invoke(&self) {
        bump(&self.invoke_requests);
    }

    pub(crate) fn record_error(&self, error: &BrokerError) {
        bump(self.errors.counter(error));
    }

    pub(crate) fn record_request_duration(&self, elapsed: Duration) {
        match self.request_duration.lock() {
            Ok(mut window) => window.record(elapsed),
            Err(err) => tracing::warn!(error = %err, "request duration lock poisoned"),
        }
    }

    /// Captures the counters together with the current registry size.
    #[must_use]
    pub fn snapshot(&self, services_registered: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            services_registered,
            registrations_total: read(&self.registrations),
            deregistrations_total: read(&self.deregistrations),
            supersessions_total: read(&self.supersessions),
            evictions_total: read(&self.evictions),
            heartbeats_total: read(&self.heartbeats),
            resolve_requests_total: read(&self.resolve_requests),
            invoke_requests_total: read(&self.invoke_requests),
            errors: self.errors.snapshot(),
            request_duration: self
                .request_duration
                .lock()
                .ok()
                .and_then(|window| window.snapshot()),
        }
    }
}

impl RemovalListener for BrokerMetrics {
    fn service_removed(&self, _service_id: ServiceId, reason: RemovalReason) {
        let counter = match reason {
            RemovalReason::Deregistered => &self.deregistrations,
            RemovalReason::Superseded => &self.supersessions,
            RemovalReason::Evicted => &self.evictions,
        };
        bump(counter);
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

fn read(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}

/// Point-in-time view of [`BrokerMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Registrations currently stored, in any liveness state.
    pub services_registered: usize,
    /// Successful registrations.
    pub registrations_total: u64,
    /// Explicit deregistrations.
    pub deregistrations_total: u64,
    /// Registrations replaced by a newer one with the same name.
    pub supersessions_total: u64,
    /// Registrations removed by the liveness sweep.
    pub evictions_total: u64,
    /// Heartbeats received, including those for unknown services.
    pub heartbeats_total: u64,
    /// Resolve requests, including those made by dispatch.
    pub resolve_requests_total: u64,
    /// Invocation attempts, including those made by dispatch.
    pub invoke_requests_total: u64,
    /// Failed operations by error kind.
    pub errors: ErrorCounts,
    /// Duration of recent invocations, or `None` before the first one.
    pub request_duration: Option<LatencySnapshot>,
}

/// Failed broker operations, one counter per [`BrokerError`] variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCounts {
    /// Contracts rejected by validation.
    pub validation: u64,
    /// Registry store failures.
    pub registration: u64,
    /// Unknown service identifiers.
    pub not_found: u64,
    /// Requests no registration satisfied.
    pub no_match: u64,
    /// Timeouts, transport failures, and invocations of unmatchable services.
    pub unreachable: u64,
    /// Application errors relayed from services.
    pub remote_error: u64,
}

impl ErrorCounts {
    /// Sums every error counter.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.validation
            .saturating_add(self.registration)
            .saturating_add(self.not_found)
            .saturating_add(self.no_match)
            .saturating_add(self.unreachable)
            .saturating_add(self.remote_error)
    }
}
