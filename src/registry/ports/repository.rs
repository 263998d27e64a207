//! Repository port for the live service registry.

use crate::registry::domain::{
    LivenessPolicy, LivenessTransition, ServiceId, ServiceRegistration,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Storage contract for service registrations and the action index.
///
/// Every mutation updates the entry table and the action index atomically
/// with respect to concurrent readers: a reader observes a registration
/// either fully indexed under all of its actions or not at all.
#[async_trait]
pub trait ServiceRegistryRepository: Send + Sync {
    /// Stores a registration, superseding any entry with the same contract
    /// name.
    ///
    /// Supersession happens under the same critical section as the insert,
    /// so concurrent registrations of one name leave exactly one survivor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateService`] when the identifier is
    /// already stored.
    async fn insert(
        &self,
        registration: &ServiceRegistration,
    ) -> RegistryResult<Option<ServiceRegistration>>;

    /// Removes a registration and every index entry pointing at it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the identifier is unknown.
    async fn remove(&self, service_id: ServiceId) -> RegistryResult<ServiceRegistration>;

    /// Finds a registration by identifier.
    async fn find_by_id(&self, service_id: ServiceId)
    -> RegistryResult<Option<ServiceRegistration>>;

    /// Finds the registration currently owning a contract name.
    async fn find_by_name(&self, name: &str) -> RegistryResult<Option<ServiceRegistration>>;

    /// Returns a snapshot of every registration indexed under `action`,
    /// regardless of liveness state.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IndexInconsistency`] when the index refers to
    /// a registration that no longer exists.
    async fn find_by_action(&self, action: &str) -> RegistryResult<Vec<ServiceRegistration>>;

    /// Returns every registration regardless of liveness state.
    async fn list_all(&self) -> RegistryResult<Vec<ServiceRegistration>>;

    /// Applies a heartbeat received at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the identifier is unknown.
    async fn record_heartbeat(
        &self,
        service_id: ServiceId,
        at: DateTime<Utc>,
    ) -> RegistryResult<LivenessTransition>;

    /// Evaluates one registration against `policy` at `now`.
    ///
    /// An evicted registration is removed in the same critical section.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the identifier is unknown.
    async fn evaluate(
        &self,
        service_id: ServiceId,
        now: DateTime<Utc>,
        policy: &LivenessPolicy,
    ) -> RegistryResult<LivenessTransition>;

    /// Evaluates every registration against `policy` at `now` and returns
    /// the transitions that changed state.
    ///
    /// Evicted registrations are removed in the same critical section.
    async fn sweep(
        &self,
        now: DateTime<Utc>,
        policy: &LivenessPolicy,
    ) -> RegistryResult<Vec<LivenessTransition>>;

    /// Returns the number of stored registrations.
    async fn count(&self) -> RegistryResult<usize>;
}

/// Errors returned by registry repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A registration with the same identifier already exists.
    #[error("duplicate service identifier: {0}")]
    DuplicateService(ServiceId),

    /// The registration was not found.
    #[error("service not found: {0}")]
    NotFound(ServiceId),

    /// The action index refers to a missing registration.
    #[error("action index for '{action}' refers to missing service {service_id}")]
    IndexInconsistency {
        /// Indexed action.
        action: String,
        /// Dangling identifier.
        service_id: ServiceId,
    },

    /// Storage-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RegistryError {
    /// Wraps a storage-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
