//! Domain model for service registrations and liveness.
//!
//! Registrations bind an immutable contract to a resolved endpoint and a
//! liveness state. State changes are computed by pure functions over the
//! time elapsed since the last heartbeat so they can be tested without real
//! timers.

mod ids;
mod liveness;
mod registration;

pub use ids::ServiceId;
pub use liveness::{
    LivenessPolicy, LivenessState, LivenessTransition, ParseLivenessStateError,
};
pub use registration::ServiceRegistration;
