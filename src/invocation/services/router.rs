//! Invocation router: bounded calls, failure classification, and latency.

use super::InvocationLedger;
use crate::invocation::{
    domain::{InvocationTarget, LatencySnapshot},
    ports::{EndpointTransport, TransportReply},
};
use crate::registry::{domain::ServiceId, ports::LivenessProbe};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Errors returned by [`InvocationRouter::invoke`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvocationError {
    /// The endpoint did not produce a reply in time or could not be reached.
    #[error("service {service_id} is unreachable: {reason}")]
    Unreachable {
        /// Target service.
        service_id: ServiceId,
        /// Failure description.
        reason: String,
    },

    /// The service replied with an application error.
    #[error("service {service_id} returned an error: {body}")]
    RemoteError {
        /// Target service.
        service_id: ServiceId,
        /// Error body exactly as returned.
        body: Value,
    },
}

/// Result type for invocation operations.
pub type InvocationResult<T> = Result<T, InvocationError>;

/// Forwards payloads to matched endpoints.
///
/// Each call holds an owned in-flight lease for the target service. The
/// lease is released on drop, so it is returned whether the call completes,
/// fails, times out, or the caller abandons the future. No lock is held
/// across the network call. The router never retries.
pub struct InvocationRouter<T, P>
where
    T: EndpointTransport,
    P: LivenessProbe,
{
    transport: Arc<T>,
    probe: Arc<P>,
    ledger: Arc<InvocationLedger>,
}

impl<T, P> InvocationRouter<T, P>
where
    T: EndpointTransport,
    P: LivenessProbe,
{
    /// Creates a router with a private ledger using default limits.
    #[must_use]
    pub fn new(transport: Arc<T>, probe: Arc<P>) -> Self {
        Self {
            transport,
            probe,
            ledger: Arc::new(InvocationLedger::new()),
        }
    }

    /// Replaces the ledger holding per-service leases and latency.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<InvocationLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Sends `payload` to `target` and awaits the reply within `timeout`.
    ///
    /// Waiting for an in-flight lease counts against `timeout`. On timeout or
    /// transport failure the liveness manager is asked to re-check the
    /// service early.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::Unreachable`] on timeout or transport
    /// failure and [`InvocationError::RemoteError`] when the service replies
    /// with an application error.
    pub async fn invoke(
        &self,
        target: &InvocationTarget,
        payload: &Value,
        timeout: Duration,
    ) -> InvocationResult<Value> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(timeout, self.call_with_lease(target, payload)).await;

        let reply = match outcome {
            Err(_elapsed) => Err(format!("no reply within {} ms", timeout.as_millis())),
            Ok(Err(reason)) => Err(reason),
            Ok(Ok(reply)) => Ok(reply),
        };

        match reply {
            Ok(TransportReply::Success(body)) => {
                self.ledger.record_latency(target.service_id, started.elapsed());
                Ok(body)
            }
            Ok(TransportReply::RemoteFailure(body)) => {
                self.ledger.record_latency(target.service_id, started.elapsed());
                tracing::debug!(
                    service_id = %target.service_id,
                    "service returned an application error"
                );
                Err(InvocationError::RemoteError {
                    service_id: target.service_id,
                    body,
                })
            }
            Err(reason) => {
                tracing::warn!(
                    service_id = %target.service_id,
                    endpoint = %target.endpoint,
                    reason = reason.as_str(),
                    "invocation failed; expediting liveness check"
                );
                self.probe.expedite(target.service_id);
                Err(InvocationError::Unreachable {
                    service_id: target.service_id,
                    reason,
                })
            }
        }
    }

    /// Returns the latency summary for a service, if it has been invoked.
    #[must_use]
    pub fn latency(&self, service_id: ServiceId) -> Option<LatencySnapshot> {
        self.ledger.latency(service_id)
    }

    /// Returns how many invocations of `service_id` are in flight.
    #[must_use]
    pub fn inflight(&self, service_id: ServiceId) -> usize {
        self.ledger.inflight(service_id)
    }

    async fn call_with_lease(
        &self,
        target: &InvocationTarget,
        payload: &Value,
    ) -> Result<TransportReply, String> {
        let _lease = self.ledger.acquire_lease(target.service_id).await?;
        self.transport
            .call(&target.endpoint, payload)
            .await
            .map_err(|err| err.to_string())
    }
}
