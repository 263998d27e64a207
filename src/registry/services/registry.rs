//! Service layer for contract registration and registry lookups.

use crate::contract::{domain::IntentContract, domain::ValidationError, validation};
use crate::registry::{
    domain::{ServiceId, ServiceRegistration},
    ports::{
        RegistryError, RemovalListener, RemovalReason, ServiceRegistryRepository,
        notify_removal,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for registry operations.
#[derive(Debug, Error)]
pub enum RegistryServiceError {
    /// The submitted contract failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(RegistryError),
    /// No registration exists with the given identifier.
    #[error("service {0} not found")]
    NotFound(ServiceId),
}

impl From<RegistryError> for RegistryServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(service_id) => Self::NotFound(service_id),
            other => Self::Repository(other),
        }
    }
}

/// Result type for registry service operations.
pub type RegistryServiceResult<T> = Result<T, RegistryServiceError>;

/// Registration and lookup orchestration over a registry repository.
///
/// Supersessions and deregistrations are reported to every registered
/// [`RemovalListener`].
#[derive(Clone)]
pub struct RegistryService<R, C>
where
    R: ServiceRegistryRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    listeners: Vec<Arc<dyn RemovalListener>>,
}

impl<R, C> RegistryService<R, C>
where
    R: ServiceRegistryRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new registry service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            listeners: Vec::new(),
        }
    }

    /// Adds a listener notified of supersessions and deregistrations.
    #[must_use]
    pub fn with_removal_listener(mut self, listener: Arc<dyn RemovalListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Validates and registers a contract.
    ///
    /// The new registration starts in `Registering` and becomes matchable
    /// after its first heartbeat. A live registration with the same contract
    /// name is superseded atomically.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Validation`] when the contract is
    /// rejected, or repository errors.
    pub async fn register(
        &self,
        contract: IntentContract,
    ) -> RegistryServiceResult<ServiceRegistration> {
        validation::validate_contract(&contract)?;
        let endpoint = contract.spec.implementation.endpoint.resolve()?;
        let registration = ServiceRegistration::new(contract, endpoint, &*self.clock);

        let superseded = self.repository.insert(&registration).await?;
        if let Some(previous) = superseded {
            tracing::info!(
                name = registration.name(),
                previous = %previous.id(),
                replacement = %registration.id(),
                "superseded existing registration"
            );
            notify_removal(&self.listeners, previous.id(), RemovalReason::Superseded);
        }
        tracing::info!(
            service_id = %registration.id(),
            name = registration.name(),
            endpoint = %registration.endpoint(),
            actions = ?registration.actions(),
            "registered service"
        );
        Ok(registration)
    }

    /// Removes a registration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::NotFound`] when the identifier is
    /// unknown, including a second deregistration of the same service.
    pub async fn deregister(&self, service_id: ServiceId) -> RegistryServiceResult<()> {
        let removed = self.repository.remove(service_id).await?;
        tracing::info!(
            service_id = %service_id,
            name = removed.name(),
            "deregistered service"
        );
        notify_removal(&self.listeners, service_id, RemovalReason::Deregistered);
        Ok(())
    }

    /// Returns a registration by identifier, whatever its liveness state.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::NotFound`] when the identifier is
    /// unknown.
    pub async fn get(&self, service_id: ServiceId) -> RegistryServiceResult<ServiceRegistration> {
        self.repository
            .find_by_id(service_id)
            .await?
            .ok_or(RegistryServiceError::NotFound(service_id))
    }

    /// Returns the registration currently owning a contract name.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn find_by_name(
        &self,
        name: &str,
    ) -> RegistryServiceResult<Option<ServiceRegistration>> {
        Ok(self.repository.find_by_name(name).await?)
    }

    /// Returns every registration indexed under `action`, in any state.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn lookup_by_action(
        &self,
        action: &str,
    ) -> RegistryServiceResult<Vec<ServiceRegistration>> {
        Ok(self.repository.find_by_action(action).await?)
    }

    /// Lists all registrations in registration order.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn list_all(&self) -> RegistryServiceResult<Vec<ServiceRegistration>> {
        Ok(self.repository.list_all().await?)
    }
}
