//! Domain model for intent contracts.
//!
//! Contracts are immutable once registered. The types here mirror the
//! submitted document shape (camelCase keys) so they can be deserialized
//! directly, while [`EndpointSpec::resolve`] and [`ParameterValue`] provide the
//! typed views the registry and matcher work with.

mod contract;
mod endpoint;
mod error;
mod pattern;
mod value;

pub use contract::{
    CONTRACT_KIND, ContractMetadata, ContractSpec, Implementation, IntentContract, QosPriority,
    QualityOfService, ResourceRequirement, SUPPORTED_VERSION,
};
pub use endpoint::{DEFAULT_GRPC_HOST, Endpoint, EndpointSpec};
pub use error::ValidationError;
pub use pattern::{IntentPattern, ParameterConstraint, ParameterType, PatternConstraints};
pub use value::ParameterValue;
