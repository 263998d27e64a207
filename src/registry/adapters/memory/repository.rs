//! In-memory repository for service registrations.

use crate::registry::{
    domain::{LivenessPolicy, LivenessTransition, ServiceId, ServiceRegistration},
    ports::{RegistryError, RegistryResult, ServiceRegistryRepository},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory service registry.
///
/// Entries, the action index, and the name index live behind one lock so
/// every mutation is observed atomically by readers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServiceRegistry {
    state: Arc<RwLock<InMemoryRegistryState>>,
}

#[derive(Debug, Default)]
struct InMemoryRegistryState {
    entries: HashMap<ServiceId, ServiceRegistration>,
    action_index: HashMap<String, BTreeSet<ServiceId>>,
    name_index: HashMap<String, ServiceId>,
}

impl InMemoryRegistryState {
    fn index(&mut self, registration: &ServiceRegistration) {
        for action in registration.actions() {
            self.action_index
                .entry(action.to_owned())
                .or_default()
                .insert(registration.id());
        }
        self.name_index
            .insert(registration.name().to_owned(), registration.id());
        self.entries
            .insert(registration.id(), registration.clone());
    }

    fn unindex(&mut self, service_id: ServiceId) -> Option<ServiceRegistration> {
        let registration = self.entries.remove(&service_id)?;
        for action in registration.actions() {
            let emptied = self.action_index.get_mut(action).is_some_and(|ids| {
                ids.remove(&service_id);
                ids.is_empty()
            });
            if emptied {
                self.action_index.remove(action);
            }
        }
        if self.name_index.get(registration.name()) == Some(&service_id) {
            self.name_index.remove(registration.name());
        }
        Some(registration)
    }

    fn evaluate(
        &mut self,
        service_id: ServiceId,
        now: DateTime<Utc>,
        policy: &LivenessPolicy,
    ) -> Option<LivenessTransition> {
        let transition = self.entries.get_mut(&service_id)?.evaluate(now, policy);
        if transition.is_eviction() {
            self.unindex(service_id);
        }
        Some(transition)
    }
}

impl InMemoryServiceRegistry {
    /// Creates an empty in-memory registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RegistryResult<RwLockReadGuard<'_, InMemoryRegistryState>> {
        self.state
            .read()
            .map_err(|err| RegistryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> RegistryResult<RwLockWriteGuard<'_, InMemoryRegistryState>> {
        self.state
            .write()
            .map_err(|err| RegistryError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl ServiceRegistryRepository for InMemoryServiceRegistry {
    async fn insert(
        &self,
        registration: &ServiceRegistration,
    ) -> RegistryResult<Option<ServiceRegistration>> {
        let mut state = self.write()?;

        if state.entries.contains_key(&registration.id()) {
            return Err(RegistryError::DuplicateService(registration.id()));
        }

        let previous = state.name_index.get(registration.name()).copied();
        let superseded = previous.and_then(|service_id| state.unindex(service_id));
        state.index(registration);
        Ok(superseded)
    }

    async fn remove(&self, service_id: ServiceId) -> RegistryResult<ServiceRegistration> {
        let mut state = self.write()?;
        state
            .unindex(service_id)
            .ok_or(RegistryError::NotFound(service_id))
    }

    async fn find_by_id(
        &self,
        service_id: ServiceId,
    ) -> RegistryResult<Option<ServiceRegistration>> {
        let state = self.read()?;
        Ok(state.entries.get(&service_id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> RegistryResult<Option<ServiceRegistration>> {
        let state = self.read()?;
        let registration = state
            .name_index
            .get(name)
            .and_then(|id| state.entries.get(id))
            .cloned();
        Ok(registration)
    }

    async fn find_by_action(&self, action: &str) -> RegistryResult<Vec<ServiceRegistration>> {
        let state = self.read()?;
        let Some(ids) = state.action_index.get(action) else {
            return Ok(Vec::new());
        };

        ids.iter()
            .map(|service_id| {
                state.entries.get(service_id).cloned().ok_or_else(|| {
                    tracing::error!(
                        action,
                        service_id = %service_id,
                        "action index refers to a missing registration"
                    );
                    RegistryError::IndexInconsistency {
                        action: action.to_owned(),
                        service_id: *service_id,
                    }
                })
            })
            .collect()
    }

    async fn list_all(&self) -> RegistryResult<Vec<ServiceRegistration>> {
        let state = self.read()?;
        let mut registrations: Vec<_> = state.entries.values().cloned().collect();
        registrations.sort_by_key(|registration| (registration.registered_at(), registration.id()));
        Ok(registrations)
    }

    async fn record_heartbeat(
        &self,
        service_id: ServiceId,
        at: DateTime<Utc>,
    ) -> RegistryResult<LivenessTransition> {
        let mut state = self.write()?;
        let registration = state
            .entries
            .get_mut(&service_id)
            .ok_or(RegistryError::NotFound(service_id))?;
        Ok(registration.record_heartbeat(at))
    }

    async fn evaluate(
        &self,
        service_id: ServiceId,
        now: DateTime<Utc>,
        policy: &LivenessPolicy,
    ) -> RegistryResult<LivenessTransition> {
        let mut state = self.write()?;
        state
            .evaluate(service_id, now, policy)
            .ok_or(RegistryError::NotFound(service_id))
    }

    async fn sweep(
        &self,
        now: DateTime<Utc>,
        policy: &LivenessPolicy,
    ) -> RegistryResult<Vec<LivenessTransition>> {
        let mut state = self.write()?;
        let mut ids: Vec<ServiceId> = state.entries.keys().copied().collect();
        ids.sort_unstable();

        let transitions = ids
            .into_iter()
            .filter_map(|service_id| state.evaluate(service_id, now, policy))
            .filter(LivenessTransition::is_change)
            .collect();
        Ok(transitions)
    }

    async fn count(&self) -> RegistryResult<usize> {
        Ok(self.read()?.entries.len())
    }
}
