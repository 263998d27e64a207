//! Application services for registration and liveness tracking.

mod liveness;
mod registry;

pub use liveness::{LivenessManager, LivenessServiceError, LivenessServiceResult};
pub use registry::{RegistryService, RegistryServiceError, RegistryServiceResult};
