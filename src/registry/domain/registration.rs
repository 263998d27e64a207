//! Service registration aggregate root.

use super::{LivenessPolicy, LivenessState, LivenessTransition, ServiceId};
use crate::contract::domain::{Endpoint, IntentContract, IntentPattern};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Live registry entry binding a validated contract to an endpoint and a
/// liveness state.
///
/// The contract is shared behind an [`Arc`] so snapshots handed to the matcher
/// are cheap and can never drift from the registered document.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRegistration {
    id: ServiceId,
    contract: Arc<IntentContract>,
    endpoint: Endpoint,
    registered_at: DateTime<Utc>,
    last_heartbeat: Option<DateTime<Utc>>,
    state: LivenessState,
    state_changed_at: DateTime<Utc>,
}

impl ServiceRegistration {
    /// Creates a registration in the `Registering` state.
    ///
    /// The contract and endpoint are expected to have passed validation.
    #[must_use]
    pub fn new(contract: IntentContract, endpoint: Endpoint, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ServiceId::new(),
            contract: Arc::new(contract),
            endpoint,
            registered_at: timestamp,
            last_heartbeat: None,
            state: LivenessState::Registering,
            state_changed_at: timestamp,
        }
    }

    /// Returns the service identifier.
    #[must_use]
    pub const fn id(&self) -> ServiceId {
        self.id
    }

    /// Returns the registered contract.
    #[must_use]
    pub fn contract(&self) -> &IntentContract {
        &self.contract
    }

    /// Returns the contract's owning capability name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.contract.name()
    }

    /// Returns the resolved endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Returns the most recent heartbeat timestamp, if any arrived.
    #[must_use]
    pub const fn last_heartbeat(&self) -> Option<DateTime<Utc>> {
        self.last_heartbeat
    }

    /// Returns the current liveness state.
    #[must_use]
    pub const fn state(&self) -> LivenessState {
        self.state
    }

    /// Returns when the liveness state last changed.
    #[must_use]
    pub const fn state_changed_at(&self) -> DateTime<Utc> {
        self.state_changed_at
    }

    /// Returns whether the registration may currently be matched.
    #[must_use]
    pub const fn is_matchable(&self) -> bool {
        self.state.is_matchable()
    }

    /// Returns the distinct actions the contract declares.
    #[must_use]
    pub fn actions(&self) -> Vec<&str> {
        self.contract.actions()
    }

    /// Iterates the contract's patterns for `action` with their declaration
    /// positions.
    pub fn patterns_for<'a>(
        &'a self,
        action: &'a str,
    ) -> impl Iterator<Item = (usize, &'a IntentPattern)> + 'a {
        self.contract
            .spec
            .intent_patterns
            .iter()
            .enumerate()
            .filter(move |(_, pattern)| pattern.action == action)
    }

    /// Returns the silence observed at `now`, measured from the last
    /// heartbeat or, before the first one, from registration.
    #[must_use]
    pub fn silence_at(&self, now: DateTime<Utc>) -> Duration {
        let reference = self.last_heartbeat.unwrap_or(self.registered_at);
        (now - reference).to_std().unwrap_or(Duration::ZERO)
    }

    /// Records a heartbeat and recomputes the state immediately.
    ///
    /// `last_heartbeat` never moves backwards: an older timestamp still
    /// restores health but leaves the stored time unchanged.
    pub fn record_heartbeat(&mut self, at: DateTime<Utc>) -> LivenessTransition {
        if self.last_heartbeat.is_none_or(|previous| at > previous) {
            self.last_heartbeat = Some(at);
        }
        let next = self.state.on_heartbeat();
        self.apply(next, at)
    }

    /// Returns how long the registration has been in its current state at
    /// `now`; negative spans clamp to zero.
    #[must_use]
    pub fn time_in_state_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.state_changed_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Re-evaluates the state against the policy at `now`.
    pub fn evaluate(&mut self, now: DateTime<Utc>, policy: &LivenessPolicy) -> LivenessTransition {
        let next = self
            .state
            .advance(self.silence_at(now), self.time_in_state_at(now), policy);
        self.apply(next, now)
    }

    fn apply(&mut self, next: LivenessState, at: DateTime<Utc>) -> LivenessTransition {
        let transition = LivenessTransition {
            service_id: self.id,
            from: self.state,
            to: next,
            at,
        };
        if transition.is_change() {
            self.state = next;
            self.state_changed_at = at;
        }
        transition
    }
}
