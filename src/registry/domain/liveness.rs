//! Liveness state machine.

use super::ServiceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Liveness state of a registration.
///
/// ```text
/// REGISTERING --heartbeat--> HEALTHY --missed--> DEGRADED --missed--> UNHEALTHY --timeout--> EVICTED
///                               ^                   |                    |
///                               +-----heartbeat-----+--------------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessState {
    /// Registered but no heartbeat received yet; not matchable.
    Registering,
    /// Heartbeats are arriving on time; matchable.
    Healthy,
    /// One heartbeat deadline missed; matchable but deprioritized.
    Degraded,
    /// Two consecutive deadlines missed; not matchable.
    Unhealthy,
    /// Unhealthy for too long; terminal and removed from the registry.
    Evicted,
}

impl LivenessState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registering => "registering",
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
            Self::Evicted => "evicted",
        }
    }

    /// Returns whether registrations in this state may be matched.
    #[must_use]
    pub const fn is_matchable(self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }

    /// Returns the matching preference; higher is preferred.
    #[must_use]
    pub const fn preference(self) -> u8 {
        match self {
            Self::Healthy => 2,
            Self::Degraded => 1,
            Self::Registering | Self::Unhealthy | Self::Evicted => 0,
        }
    }

    /// Returns the state after a heartbeat arrives.
    ///
    /// Every non-terminal state returns to `Healthy`.
    #[must_use]
    pub const fn on_heartbeat(self) -> Self {
        match self {
            Self::Evicted => Self::Evicted,
            Self::Registering | Self::Healthy | Self::Degraded | Self::Unhealthy => Self::Healthy,
        }
    }

    /// Returns the state after a sweep.
    ///
    /// `silence` is the time since the last heartbeat (or since
    /// registration, if none arrived yet) and `in_state` the time since the
    /// state last changed. Missed deadlines are judged on silence; eviction
    /// of an unhealthy service is judged on how long it has been unhealthy.
    ///
    /// At most one step is taken per evaluation, so a sweep that runs late
    /// still walks `Healthy -> Degraded -> Unhealthy -> Evicted` in order.
    #[must_use]
    pub fn advance(self, silence: Duration, in_state: Duration, policy: &LivenessPolicy) -> Self {
        match self {
            Self::Registering if silence > policy.registration_timeout => Self::Evicted,
            Self::Healthy if silence > policy.degraded_after => Self::Degraded,
            Self::Degraded if silence > policy.unhealthy_after => Self::Unhealthy,
            Self::Unhealthy if in_state > policy.eviction_after => Self::Evicted,
            unchanged => unchanged,
        }
    }
}

impl fmt::Display for LivenessState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LivenessState {
    type Error = ParseLivenessStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "registering" => Ok(Self::Registering),
            "healthy" => Ok(Self::Healthy),
            "degraded" => Ok(Self::Degraded),
            "unhealthy" => Ok(Self::Unhealthy),
            "evicted" => Ok(Self::Evicted),
            _ => Err(ParseLivenessStateError(value.to_owned())),
        }
    }
}

/// Error returned while parsing a liveness state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown liveness state: {0}")]
pub struct ParseLivenessStateError(pub String);

/// Heartbeat thresholds driving the liveness state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessPolicy {
    /// Expected period between heartbeats.
    pub heartbeat_interval: Duration,
    /// Silence after which a healthy service is degraded.
    pub degraded_after: Duration,
    /// Silence after which a degraded service is unhealthy.
    pub unhealthy_after: Duration,
    /// Time spent unhealthy before eviction.
    pub eviction_after: Duration,
    /// Time a registration may wait for its first heartbeat before it is
    /// evicted without ever becoming matchable.
    pub registration_timeout: Duration,
}

impl LivenessPolicy {
    /// Derives thresholds from the heartbeat interval: degraded after two
    /// intervals of silence, unhealthy after four, evicted after six more
    /// spent unhealthy. A registration gets ten intervals to send its first
    /// heartbeat.
    #[must_use]
    pub const fn from_interval(heartbeat_interval: Duration) -> Self {
        Self {
            heartbeat_interval,
            degraded_after: heartbeat_interval.saturating_mul(2),
            unhealthy_after: heartbeat_interval.saturating_mul(4),
            eviction_after: heartbeat_interval.saturating_mul(6),
            registration_timeout: heartbeat_interval.saturating_mul(10),
        }
    }
}

impl Default for LivenessPolicy {
    fn default() -> Self {
        Self::from_interval(Duration::from_secs(10))
    }
}

/// A state change observed for one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessTransition {
    /// Affected registration.
    pub service_id: ServiceId,
    /// State before evaluation.
    pub from: LivenessState,
    /// State after evaluation.
    pub to: LivenessState,
    /// Evaluation time.
    pub at: DateTime<Utc>,
}

impl LivenessTransition {
    /// Returns whether the state actually changed.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.from != self.to
    }

    /// Returns whether the registration was evicted by this transition.
    #[must_use]
    pub fn is_eviction(&self) -> bool {
        self.is_change() && self.to == LivenessState::Evicted
    }
}
