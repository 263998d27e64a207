//! Port contracts for the service registry and liveness signalling.

mod listener;
mod probe;
mod repository;

pub(crate) use listener::notify_removal;
pub use listener::{RemovalListener, RemovalReason};
pub use probe::LivenessProbe;
pub use repository::{RegistryError, RegistryResult, ServiceRegistryRepository};
