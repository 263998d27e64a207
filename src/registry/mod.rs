//! Live service registry and liveness tracking.
//!
//! The registry is the authoritative table of registered services, their
//! validated contracts, endpoints, and liveness states, together with the
//! action index the matcher searches. Liveness is modelled as a pure state
//! machine in the domain and driven by the [`services::LivenessManager`].
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
