//! Invocation domain: targets and latency metrics.

mod latency;
mod target;

pub use latency::{DEFAULT_LATENCY_WINDOW, LatencySnapshot, RollingLatency};
pub use target::InvocationTarget;
