//! HTTP transport backed by a pooled `reqwest` client.

mod transport;

pub use transport::HttpEndpointTransport;
