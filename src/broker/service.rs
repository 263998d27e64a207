//! The `IntentBroker` facade.

use super::{BrokerError, BrokerMetrics, BrokerResult, MetricsSnapshot, ServingStatus};
use crate::config::BrokerConfig;
use crate::contract::domain::IntentContract;
use crate::invocation::{
    domain::{InvocationTarget, LatencySnapshot},
    ports::EndpointTransport,
    services::{InvocationLedger, InvocationRouter},
};
use crate::matching::{
    domain::{IntentRequest, MatchResult},
    services::MatchingEngine,
};
use crate::registry::{
    domain::{LivenessState, ServiceId, ServiceRegistration},
    ports::{RemovalListener, ServiceRegistryRepository},
    services::{LivenessManager, RegistryService},
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// One broker instance: registry, liveness tracking, matching, and routing.
///
/// Every removal from the registry, whether by deregistration, supersession,
/// or eviction, drops the service's invocation state and is counted in the
/// broker metrics.
pub struct IntentBroker<R, T, C>
where
    R: ServiceRegistryRepository + 'static,
    T: EndpointTransport + 'static,
    C: Clock + Send + Sync + 'static,
{
    repository: Arc<R>,
    registry: RegistryService<R, C>,
    liveness: Arc<LivenessManager<R, C>>,
    matcher: MatchingEngine<R>,
    router: InvocationRouter<T, LivenessManager<R, C>>,
    ledger: Arc<InvocationLedger>,
    metrics: Arc<BrokerMetrics>,
    default_timeout: Duration,
    shutdown: watch::Sender<bool>,
}

impl<R, T, C> IntentBroker<R, T, C>
where
    R: ServiceRegistryRepository + 'static,
    T: EndpointTransport + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Wires a broker over the given registry store, transport, and clock.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        transport: Arc<T>,
        clock: Arc<C>,
        config: &BrokerConfig,
    ) -> Self {
        let ledger = Arc::new(
            InvocationLedger::new()
                .with_max_inflight(config.max_inflight_per_service)
                .with_latency_window(config.latency_window),
        );
        let metrics = Arc::new(BrokerMetrics::new(config.latency_window));
        let ledger_listener: Arc<dyn RemovalListener> = ledger.clone();
        let metrics_listener: Arc<dyn RemovalListener> = metrics.clone();

        let liveness = Arc::new(
            LivenessManager::new(
                Arc::clone(&repository),
                Arc::clone(&clock),
                config.liveness_policy(),
            )
            .with_sweep_interval(config.sweep_interval())
            .with_removal_listener(Arc::clone(&ledger_listener))
            .with_removal_listener(Arc::clone(&metrics_listener)),
        );
        let registry = RegistryService::new(Arc::clone(&repository), clock)
            .with_removal_listener(ledger_listener)
            .with_removal_listener(metrics_listener);
        let router = InvocationRouter::new(transport, Arc::clone(&liveness))
            .with_ledger(Arc::clone(&ledger));
        let (shutdown, _) = watch::channel(false);

        Self {
            registry,
            matcher: MatchingEngine::new(Arc::clone(&repository)),
            repository,
            liveness,
            router,
            ledger,
            metrics,
            default_timeout: config.invocation_timeout(),
            shutdown,
        }
    }

    /// Validates and registers a contract, returning the new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Validation`] for rejected contracts and
    /// [`BrokerError::Registration`] when the registry cannot store it.
    pub async fn register_intent(&self, contract: IntentContract) -> BrokerResult<ServiceId> {
        let result = self.registry.register(contract).await;
        let outcome = result.map_err(BrokerError::from).map(|registration| {
            self.metrics.record_registration();
            registration.id()
        });
        self.observe(outcome)
    }

    /// Removes a registration from any liveness state.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::NotFound`] when the identifier is unknown.
    pub async fn deregister(&self, service_id: ServiceId) -> BrokerResult<()> {
        let result = self.registry.deregister(service_id).await;
        self.observe(result.map_err(BrokerError::from))
    }

    /// Records a heartbeat and returns the resulting liveness state.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::NotFound`] when the identifier is unknown.
    pub async fn heartbeat(&self, service_id: ServiceId) -> BrokerResult<LivenessState> {
        self.metrics.record_heartbeat();
        let result = self.liveness.heartbeat(service_id).await;
        self.observe(result.map_err(BrokerError::from))
    }

    /// Resolves a request to the best matching service and endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::NoMatch`] when nothing matches.
    pub async fn resolve_intent(&self, request: &IntentRequest) -> BrokerResult<MatchResult> {
        self.metrics.record_resolve();
        let result = self.matcher.resolve(request).await;
        self.observe(result.map_err(BrokerError::from))
    }

    /// Invokes a registered service.
    ///
    /// `timeout_millis` of `None` uses the configured default. Only
    /// `Healthy` and `Degraded` services are invoked.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::NotFound`] for unknown identifiers,
    /// [`BrokerError::Unreachable`] for services that are not matchable or
    /// do not answer in time, and [`BrokerError::RemoteError`] for
    /// application errors returned by the service.
    pub async fn invoke(
        &self,
        service_id: ServiceId,
        payload: &Value,
        timeout_millis: Option<u64>,
    ) -> BrokerResult<Value> {
        self.metrics.record_invoke();
        let started = Instant::now();
        let result = self
            .invoke_registered(service_id, payload, timeout_millis)
            .await;
        self.metrics.record_request_duration(started.elapsed());
        self.observe(result)
    }

    async fn invoke_registered(
        &self,
        service_id: ServiceId,
        payload: &Value,
        timeout_millis: Option<u64>,
    ) -> BrokerResult<Value> {
        let registration = self.registry.get(service_id).await?;
        if !registration.is_matchable() {
            return Err(BrokerError::Unreachable {
                service_id,
                reason: format!("service is {}", registration.state()),
            });
        }

        let timeout = timeout_millis.map_or(self.default_timeout, Duration::from_millis);
        let target = InvocationTarget::from(&registration);
        Ok(self.router.invoke(&target, payload, timeout).await?)
    }

    /// Resolves a request and invokes the winner in one step.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::resolve_intent`] and [`Self::invoke`].
    pub async fn dispatch(
        &self,
        request: &IntentRequest,
        payload: &Value,
        timeout_millis: Option<u64>,
    ) -> BrokerResult<Value> {
        let resolved = self.resolve_intent(request).await?;
        self.metrics.record_invoke();
        let started = Instant::now();
        let timeout = timeout_millis.map_or(self.default_timeout, Duration::from_millis);
        let result = self
            .router
            .invoke(&InvocationTarget::from(resolved), payload, timeout)
            .await;
        self.metrics.record_request_duration(started.elapsed());
        self.observe(result.map_err(BrokerError::from))
    }

    /// Returns a registration in any liveness state.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::NotFound`] when the identifier is unknown.
    pub async fn get(&self, service_id: ServiceId) -> BrokerResult<ServiceRegistration> {
        Ok(self.registry.get(service_id).await?)
    }

    /// Lists every registration in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Registration`] when the registry is unusable.
    pub async fn list_services(&self) -> BrokerResult<Vec<ServiceRegistration>> {
        Ok(self.registry.list_all().await?)
    }

    /// Reports broker-internal health.
    pub async fn health_check(&self) -> ServingStatus {
        if *self.shutdown.borrow() {
            return ServingStatus::NotServing;
        }
        match self.repository.count().await {
            Ok(_) => ServingStatus::Serving,
            Err(err) => {
                tracing::error!(error = %err, "registry store is unusable");
                ServingStatus::NotServing
            }
        }
    }

    /// Returns the latency summary of a service, if it has been invoked.
    #[must_use]
    pub fn latency(&self, service_id: ServiceId) -> Option<LatencySnapshot> {
        self.router.latency(service_id)
    }

    /// Returns the per-service lease and latency ledger.
    #[must_use]
    pub fn ledger(&self) -> &InvocationLedger {
        &self.ledger
    }

    /// Captures the broker counters and the current registry size.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Registration`] when the registry is unusable.
    pub async fn metrics(&self) -> BrokerResult<MetricsSnapshot> {
        let services_registered = self.repository.count().await?;
        Ok(self.metrics.snapshot(services_registered))
    }

    /// Returns the liveness manager.
    #[must_use]
    pub fn liveness(&self) -> &LivenessManager<R, C> {
        &self.liveness
    }

    /// Starts the background liveness loop; it stops on [`Self::shutdown`].
    #[must_use = "the handle should be awaited after shutdown"]
    pub fn spawn_liveness(&self) -> JoinHandle<()> {
        let liveness = Arc::clone(&self.liveness);
        let shutdown = self.shutdown.subscribe();
        tokio::spawn(async move { liveness.run(shutdown).await })
    }

    /// Signals shutdown to background tasks and marks the broker not serving.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        tracing::info!("broker shutting down");
    }

    fn observe<V>(&self, result: BrokerResult<V>) -> BrokerResult<V> {
        if let Err(err) = &result {
            self.metrics.record_error(err);
        }
        result
    }
}
