//! Implementation endpoint value objects.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host used for gRPC endpoints that only declare a port.
pub const DEFAULT_GRPC_HOST: &str = "127.0.0.1";

/// Endpoint exactly as submitted in a contract document.
///
/// Which fields are required depends on `type`; [`EndpointSpec::resolve`]
/// checks them and produces a typed [`Endpoint`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    /// Transport kind, `grpc` or `http`.
    #[serde(rename = "type")]
    pub transport: String,
    /// Host for `grpc` endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Port for `grpc` endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
    /// Procedure name for `grpc` endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    /// Target URL for `http` endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl EndpointSpec {
    /// Creates a `grpc` endpoint specification on the default host.
    #[must_use]
    pub fn grpc(port: u32, procedure: impl Into<String>) -> Self {
        Self {
            transport: "grpc".to_owned(),
            port: Some(port),
            procedure: Some(procedure.into()),
            ..Self::default()
        }
    }

    /// Creates an `http` endpoint specification.
    #[must_use]
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            transport: "http".to_owned(),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Sets an explicit host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Checks the fields the declared transport requires and returns the
    /// typed endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedEndpointType`] for unknown
    /// transports, [`ValidationError::MissingEndpointField`] when a required
    /// field is absent or blank, [`ValidationError::InvalidEndpointPort`] for
    /// ports outside `1..=65535`, and [`ValidationError::InvalidEndpointUrl`]
    /// for URLs without an `http://` or `https://` scheme.
    pub fn resolve(&self) -> Result<Endpoint, ValidationError> {
        match self.transport.trim().to_ascii_lowercase().as_str() {
            "grpc" => self.resolve_grpc(),
            "http" => self.resolve_http(),
            _ => Err(ValidationError::UnsupportedEndpointType(
                self.transport.clone(),
            )),
        }
    }

    fn resolve_grpc(&self) -> Result<Endpoint, ValidationError> {
        let raw_port = self
            .port
            .ok_or_else(|| ValidationError::missing_endpoint_field("grpc", "port"))?;
        let port = u16::try_from(raw_port)
            .ok()
            .filter(|port| *port != 0)
            .ok_or(ValidationError::InvalidEndpointPort(raw_port))?;

        let procedure = required_text(self.procedure.as_deref())
            .ok_or_else(|| ValidationError::missing_endpoint_field("grpc", "procedure"))?;

        let host = required_text(self.host.as_deref()).unwrap_or(DEFAULT_GRPC_HOST);

        Ok(Endpoint::Grpc {
            host: host.to_owned(),
            port,
            procedure: procedure.to_owned(),
        })
    }

    fn resolve_http(&self) -> Result<Endpoint, ValidationError> {
        let url = required_text(self.url.as_deref())
            .ok_or_else(|| ValidationError::missing_endpoint_field("http", "url"))?;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ValidationError::InvalidEndpointUrl(url.to_owned()));
        }

        Ok(Endpoint::Http {
            url: url.to_owned(),
        })
    }
}

fn required_text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

/// Validated endpoint of a registered service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Endpoint {
    /// A gRPC procedure.
    Grpc {
        /// Host name or address.
        host: String,
        /// TCP port.
        port: u16,
        /// Fully qualified procedure name.
        procedure: String,
    },
    /// An HTTP endpoint accepting JSON payloads.
    Http {
        /// Target URL.
        url: String,
    },
}

impl Endpoint {
    /// Returns the transport kind.
    #[must_use]
    pub const fn transport(&self) -> &'static str {
        match self {
            Self::Grpc { .. } => "grpc",
            Self::Http { .. } => "http",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grpc {
                host,
                port,
                procedure,
            } => write!(formatter, "grpc://{host}:{port}/{procedure}"),
            Self::Http { url } => formatter.write_str(url),
        }
    }
}
