//! Application services for intent resolution.

mod engine;

pub use engine::{MatchError, MatchingEngine, MatchingResult};
