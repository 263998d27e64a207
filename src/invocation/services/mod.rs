//! Application services for invocation routing.

mod ledger;
mod router;

pub use ledger::{DEFAULT_MAX_INFLIGHT_PER_SERVICE, InvocationLedger};
pub use router::{InvocationError, InvocationResult, InvocationRouter};
