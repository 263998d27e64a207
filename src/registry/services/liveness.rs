//! Heartbeat handling and the periodic liveness sweep.

use crate::registry::{
    domain::{LivenessPolicy, LivenessState, LivenessTransition, ServiceId},
    ports::{
        LivenessProbe, RegistryError, RemovalListener, RemovalReason, ServiceRegistryRepository,
        notify_removal,
    },
};
use mockable::Clock;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Notify, watch};
use tokio::time::MissedTickBehavior;

/// Service-level errors for liveness operations.
#[derive(Debug, Error)]
pub enum LivenessServiceError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(RegistryError),
    /// No registration exists with the given identifier.
    #[error("service {0} not found")]
    NotFound(ServiceId),
}

impl From<RegistryError> for LivenessServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(service_id) => Self::NotFound(service_id),
            other => Self::Repository(other),
        }
    }
}

/// Result type for liveness operations.
pub type LivenessServiceResult<T> = Result<T, LivenessServiceError>;

/// Drives registrations through the liveness state machine.
///
/// Heartbeats are applied synchronously. Silence is detected by a sweep that
/// runs every `sweep_interval`, plus targeted evaluations requested through
/// [`LivenessProbe::expedite`]. Evictions are reported to every registered
/// [`RemovalListener`].
pub struct LivenessManager<R, C>
where
    R: ServiceRegistryRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    policy: LivenessPolicy,
    sweep_interval: Duration,
    expedited: Mutex<BTreeSet<ServiceId>>,
    wake: Notify,
    listeners: Vec<Arc<dyn RemovalListener>>,
}

impl<R, C> LivenessManager<R, C>
where
    R: ServiceRegistryRepository,
    C: Clock + Send + Sync,
{
    /// Creates a manager sweeping once per heartbeat interval.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>, policy: LivenessPolicy) -> Self {
        Self {
            repository,
            clock,
            sweep_interval: policy.heartbeat_interval,
            policy,
            expedited: Mutex::new(BTreeSet::new()),
            wake: Notify::new(),
            listeners: Vec::new(),
        }
    }

    /// Overrides the sweep cadence.
    #[must_use]
    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Adds a listener notified of every eviction.
    #[must_use]
    pub fn with_removal_listener(mut self, listener: Arc<dyn RemovalListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &LivenessPolicy {
        &self.policy
    }

    /// Records a heartbeat and returns the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`LivenessServiceError::NotFound`] when the identifier is
    /// unknown, including services that were already evicted.
    pub async fn heartbeat(&self, service_id: ServiceId) -> LivenessServiceResult<LivenessState> {
        let transition = self
            .repository
            .record_heartbeat(service_id, self.clock.utc())
            .await?;
        if transition.is_change() {
            log_transition(&transition);
        }
        Ok(transition.to)
    }

    /// Evaluates every registration once and returns the state changes.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn sweep(&self) -> LivenessServiceResult<Vec<LivenessTransition>> {
        let transitions = self
            .repository
            .sweep(self.clock.utc(), &self.policy)
            .await?;
        for transition in &transitions {
            self.observe(transition);
        }
        Ok(transitions)
    }

    /// Evaluates the services flagged through [`LivenessProbe::expedite`].
    ///
    /// Services that disappeared in the meantime are skipped.
    ///
    /// # Errors
    ///
    /// Returns repository errors other than a missing service.
    pub async fn evaluate_expedited(&self) -> LivenessServiceResult<Vec<LivenessTransition>> {
        let pending = self.take_expedited();
        let mut transitions = Vec::new();
        for service_id in pending {
            match self
                .repository
                .evaluate(service_id, self.clock.utc(), &self.policy)
                .await
            {
                Ok(transition) if transition.is_change() => {
                    self.observe(&transition);
                    transitions.push(transition);
                }
                Ok(_) | Err(RegistryError::NotFound(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(transitions)
    }

    /// Runs sweeps until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            sweep_interval_ms = self.sweep_interval.as_millis(),
            "liveness manager started"
        );

        while !*shutdown.borrow_and_update() {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.sweep().await {
                        tracing::error!(error = %err, "liveness sweep failed");
                    }
                }
                () = self.wake.notified() => {
                    if let Err(err) = self.evaluate_expedited().await {
                        tracing::error!(error = %err, "expedited liveness check failed");
                    }
                }
            }
        }

        tracing::info!("liveness manager stopped");
    }

    fn observe(&self, transition: &LivenessTransition) {
        log_transition(transition);
        if transition.is_eviction() {
            notify_removal(&self.listeners, transition.service_id, RemovalReason::Evicted);
        }
    }

    fn take_expedited(&self) -> BTreeSet<ServiceId> {
        match self.expedited.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(err) => {
                tracing::warn!(error = %err, "expedite queue lock poisoned");
                BTreeSet::new()
            }
        }
    }
}

impl<R, C> LivenessProbe for LivenessManager<R, C>
where
    R: ServiceRegistryRepository,
    C: Clock + Send + Sync,
{
    fn expedite(&self, service_id: ServiceId) {
        match self.expedited.lock() {
            Ok(mut pending) => {
                pending.insert(service_id);
            }
            Err(err) => {
                tracing::warn!(error = %err, service_id = %service_id, "expedite queue lock poisoned");
                return;
            }
        }
        self.wake.notify_one();
    }
}

fn log_transition(transition: &LivenessTransition) {
    match transition.to {
        LivenessState::Evicted => tracing::info!(
            service_id = %transition.service_id,
            from = %transition.from,
            "evicted service"
        ),
        LivenessState::Degraded | LivenessState::Unhealthy => tracing::warn!(
            service_id = %transition.service_id,
            from = %transition.from,
            to = %transition.to,
            "service missed heartbeat deadline"
        ),
        LivenessState::Registering | LivenessState::Healthy => tracing::debug!(
            service_id = %transition.service_id,
            from = %transition.from,
            to = %transition.to,
            "liveness state changed"
        ),
    }
}
