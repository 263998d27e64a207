//! Scripted in-memory transport.

mod transport;

pub use transport::{EndpointBehaviour, InMemoryEndpointTransport};
