//! Intent broker: capability discovery and routing by declared intent.
//!
//! Services publish intent contracts describing which actions they handle,
//! under which parameter constraints, and where to reach them. The broker
//! validates and registers those contracts, tracks each registration's
//! liveness from heartbeats, resolves intent requests to the best matching
//! service, and forwards invocations to the chosen endpoint.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles per bounded context:
//!
//! - **Domain**: Pure types and rules with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage and transport
//! - **Adapters**: Concrete implementations of ports (in-memory, HTTP)
//! - **Services**: Orchestration over ports
//!
//! # Modules
//!
//! - [`contract`]: Intent contract model and validation
//! - [`registry`]: Live service registry and liveness state machine
//! - [`matching`]: Constraint evaluation and ranking of candidates
//! - [`invocation`]: Bounded endpoint calls and latency metrics
//! - [`broker`]: Facade exposing the broker operations
//! - [`config`]: Runtime configuration

pub mod broker;
pub mod config;
pub mod contract;
pub mod invocation;
pub mod matching;
pub mod registry;
