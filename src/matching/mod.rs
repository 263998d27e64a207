//! Intent resolution over the live registry.
//!
//! A request names an action and binds parameters. The engine filters the
//! registrations indexed under the action down to matchable ones, evaluates
//! every pattern for that action against the bound parameters, and returns
//! the highest-ranked surviving (registration, pattern) pair.
//!
//! - Domain types and pure evaluation in [`domain`]
//! - The read-only resolution service in [`services`]

pub mod domain;
pub mod services;
