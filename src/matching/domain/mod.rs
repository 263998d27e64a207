//! Matching domain: requests, constraint evaluation, and ranking.

mod constraint;
mod ranking;
mod request;

pub use constraint::{ConstraintViolation, evaluate_pattern};
pub use ranking::{MatchCandidate, MatchResult};
pub use request::IntentRequest;
