//! Ranking of matching (registration, pattern) pairs.

use crate::contract::domain::{Endpoint, IntentPattern};
use crate::registry::domain::{LivenessState, ServiceId, ServiceRegistration};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A registration pattern that satisfied a request.
#[derive(Debug, Clone, Copy)]
pub struct MatchCandidate<'a> {
    registration: &'a ServiceRegistration,
    pattern_index: usize,
    pattern: &'a IntentPattern,
}

impl<'a> MatchCandidate<'a> {
    /// Wraps a satisfied pattern at its declaration position.
    #[must_use]
    pub const fn new(
        registration: &'a ServiceRegistration,
        pattern_index: usize,
        pattern: &'a IntentPattern,
    ) -> Self {
        Self {
            registration,
            pattern_index,
            pattern,
        }
    }

    /// Orders candidates best-first.
    ///
    /// Keys, in order: liveness preference (`Healthy` before `Degraded`),
    /// declared QoS priority (higher first), pattern specificity (higher
    /// first), registration time (older first), pattern declaration order,
    /// and finally the service identifier so the order is total.
    #[must_use]
    pub fn rank(&self, other: &Self) -> Ordering {
        let (mine, theirs) = (self.registration, other.registration);
        theirs
            .state()
            .preference()
            .cmp(&mine.state().preference())
            .then_with(|| theirs.contract().priority().cmp(&mine.contract().priority()))
            .then_with(|| other.pattern.specificity().cmp(&self.pattern.specificity()))
            .then_with(|| mine.registered_at().cmp(&theirs.registered_at()))
            .then_with(|| self.pattern_index.cmp(&other.pattern_index))
            .then_with(|| mine.id().cmp(&theirs.id()))
    }

    /// Returns the winning pair as an owned result.
    #[must_use]
    pub fn into_result(self) -> MatchResult {
        MatchResult {
            service_id: self.registration.id(),
            name: self.registration.name().to_owned(),
            endpoint: self.registration.endpoint().clone(),
            pattern_index: self.pattern_index,
            pattern: self.pattern.clone(),
            state: self.registration.state(),
        }
    }
}

/// The resolved target of an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Winning registration.
    pub service_id: ServiceId,
    /// Contract name of the winning registration.
    pub name: String,
    /// Endpoint to invoke.
    pub endpoint: Endpoint,
    /// Position of the matched pattern within the contract.
    pub pattern_index: usize,
    /// The matched pattern.
    pub pattern: IntentPattern,
    /// Liveness state observed when matching.
    pub state: LivenessState,
}
