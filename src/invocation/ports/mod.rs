//! Port contracts for endpoint invocation.

mod transport;

pub use transport::{EndpointTransport, TransportError, TransportReply, TransportResult};
