//! Invocation of resolved endpoints.
//!
//! The router forwards a JSON payload to a matched endpoint through an
//! [`ports::EndpointTransport`], bounds the call with a timeout, classifies
//! failures, and keeps a rolling latency window per service for
//! observability. Unreachable endpoints are reported to the liveness manager
//! so it can re-check them early.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The router service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
