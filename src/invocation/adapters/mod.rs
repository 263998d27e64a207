//! Adapter implementations for the endpoint transport port.

pub mod http;
pub mod memory;

pub use http::HttpEndpointTransport;
pub use memory::{EndpointBehaviour, InMemoryEndpointTransport};
