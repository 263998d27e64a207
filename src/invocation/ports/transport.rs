//! Transport port used by the invocation router.

use crate::contract::domain::Endpoint;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// A well-formed reply from an invoked service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportReply {
    /// The service handled the request.
    Success(Value),
    /// The service reported an application error; relayed verbatim.
    RemoteFailure(Value),
}

/// Sends payloads to service endpoints.
///
/// Implementations must not retry; retry policy belongs to the caller.
#[async_trait]
pub trait EndpointTransport: Send + Sync {
    /// Sends `payload` to `endpoint` and awaits the reply.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no well-formed reply was received.
    async fn call(&self, endpoint: &Endpoint, payload: &Value) -> TransportResult<TransportReply>;
}

/// Failures that prevented a well-formed reply.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The adapter cannot reach this kind of endpoint.
    #[error("unsupported endpoint transport '{0}'")]
    Unsupported(&'static str),

    /// No connection could be established.
    #[error("connection failed: {0}")]
    Connect(Arc<dyn std::error::Error + Send + Sync>),

    /// The exchange failed after connecting.
    #[error("transport I/O failed: {0}")]
    Io(Arc<dyn std::error::Error + Send + Sync>),

    /// The reply could not be decoded.
    #[error("reply could not be decoded: {0}")]
    Decode(Arc<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Wraps a connection failure.
    pub fn connect(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Connect(Arc::new(err))
    }

    /// Wraps an I/O failure.
    pub fn io(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Io(Arc::new(err))
    }

    /// Wraps a decoding failure.
    pub fn decode(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Decode(Arc::new(err))
    }
}
