//! Broker facade over the registry, liveness, matching, and invocation
//! contexts.
//!
//! [`IntentBroker`] exposes the broker's logical operations independently of
//! any wire encoding. Every instance owns its own registry, so many isolated
//! brokers can coexist in one process.

mod error;
mod metrics;
mod service;
mod status;

pub use error::{BrokerError, BrokerResult};
pub use metrics::{BrokerMetrics, ErrorCounts, MetricsSnapshot};
pub use service::IntentBroker;
pub use status::ServingStatus;
