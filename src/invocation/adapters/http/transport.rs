//! HTTP adapter posting JSON payloads to `http` endpoints.

use crate::contract::domain::Endpoint;
use crate::invocation::ports::{EndpointTransport, TransportError, TransportReply, TransportResult};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("intent-broker/", env!("CARGO_PKG_VERSION"));

/// Transport that POSTs JSON to HTTP endpoints over a shared, pooled client.
///
/// The router owns the call timeout, so the client is built without one.
/// `grpc` endpoints are reported as unsupported.
#[derive(Debug, Clone)]
pub struct HttpEndpointTransport {
    client: reqwest::Client,
}

impl HttpEndpointTransport {
    /// Builds a transport with a pooled client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when the client cannot be built.
    pub fn new() -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(TransportError::io)?;
        Ok(Self::with_client(client))
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn post(&self, url: &str, payload: &Value) -> TransportResult<TransportReply> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(classify)?;
        let status = response.status();
        let body = response.bytes().await.map_err(TransportError::io)?;

        if status.is_success() {
            return decode_body(&body).map(TransportReply::Success);
        }

        // Non-JSON error bodies are relayed as a string.
        let failure = decode_body(&body).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&body).into_owned())
        });
        tracing::debug!(url, status = status.as_u16(), "endpoint returned an error status");
        Ok(TransportReply::RemoteFailure(failure))
    }
}

#[async_trait]
impl EndpointTransport for HttpEndpointTransport {
    async fn call(&self, endpoint: &Endpoint, payload: &Value) -> TransportResult<TransportReply> {
        match endpoint {
            Endpoint::Http { url } => self.post(url, payload).await,
            Endpoint::Grpc { .. } => Err(TransportError::Unsupported(endpoint.transport())),
        }
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_connect() || err.is_timeout() {
        TransportError::connect(err)
    } else {
        TransportError::io(err)
    }
}

fn decode_body(body: &[u8]) -> TransportResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(TransportError::decode)
}
