//! In-memory transport adapter for router and broker tests.

use crate::contract::domain::Endpoint;
use crate::invocation::ports::{EndpointTransport, TransportError, TransportReply, TransportResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Scripted response of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointBehaviour {
    /// Replies successfully with a fixed body.
    Respond(Value),
    /// Replies successfully with the request payload.
    Echo,
    /// Replies with an application error body.
    RemoteFailure(Value),
    /// Refuses the connection.
    Unreachable(String),
    /// Waits before echoing the payload.
    Stall(Duration),
}

/// In-memory transport adapter.
///
/// Each endpoint answers according to its scripted [`EndpointBehaviour`];
/// endpoints without a script refuse connections. Calls are counted per
/// endpoint so tests can assert on routing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEndpointTransport {
    state: Arc<RwLock<InMemoryTransportState>>,
}

#[derive(Debug, Default)]
struct InMemoryTransportState {
    behaviours: HashMap<Endpoint, EndpointBehaviour>,
    calls: HashMap<Endpoint, usize>,
}

impl InMemoryEndpointTransport {
    /// Creates a transport with no scripted endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the behaviour of `endpoint`, replacing any previous script.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when lock acquisition fails.
    pub fn script(&self, endpoint: Endpoint, behaviour: EndpointBehaviour) -> TransportResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| TransportError::io(std::io::Error::other(err.to_string())))?;
        state.behaviours.insert(endpoint, behaviour);
        Ok(())
    }

    /// Returns how many calls reached `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when lock acquisition fails.
    pub fn call_count(&self, endpoint: &Endpoint) -> TransportResult<usize> {
        let state = self
            .state
            .read()
            .map_err(|err| TransportError::io(std::io::Error::other(err.to_string())))?;
        Ok(state.calls.get(endpoint).copied().unwrap_or_default())
    }

    fn begin_call(&self, endpoint: &Endpoint) -> TransportResult<Option<EndpointBehaviour>> {
        let mut state = self
            .state
            .write()
            .map_err(|err| TransportError::io(std::io::Error::other(err.to_string())))?;
        *state.calls.entry(endpoint.clone()).or_default() += 1;
        Ok(state.behaviours.get(endpoint).cloned())
    }
}

#[async_trait]
impl EndpointTransport for InMemoryEndpointTransport {
    async fn call(&self, endpoint: &Endpoint, payload: &Value) -> TransportResult<TransportReply> {
        let behaviour = self.begin_call(endpoint)?;
        match behaviour {
            Some(EndpointBehaviour::Respond(body)) => Ok(TransportReply::Success(body)),
            Some(EndpointBehaviour::Echo) => Ok(TransportReply::Success(payload.clone())),
            Some(EndpointBehaviour::RemoteFailure(body)) => Ok(TransportReply::RemoteFailure(body)),
            Some(EndpointBehaviour::Unreachable(reason)) => Err(TransportError::connect(
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, reason),
            )),
            Some(EndpointBehaviour::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(TransportReply::Success(payload.clone()))
            }
            None => Err(TransportError::connect(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("no listener at {endpoint}"),
            ))),
        }
    }
}
