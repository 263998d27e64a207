//! Broker configuration.
//!
//! Configuration is resolved from built-in defaults, overridden either by
//! `INTENT_BROKER_*` environment variables or by a TOML document. Liveness
//! thresholds left unset are derived from the heartbeat interval.

use crate::invocation::domain::DEFAULT_LATENCY_WINDOW;
use crate::invocation::services::DEFAULT_MAX_INFLIGHT_PER_SERVICE;
use crate::registry::domain::LivenessPolicy;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Prefix shared by every environment variable the broker reads.
pub const ENV_PREFIX: &str = "INTENT_BROKER_";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML document is malformed.
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment variable could not be parsed.
    #[error("environment variable {key} has invalid value '{value}'")]
    InvalidVariable {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
    },

    /// The resolved configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration of one broker instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    /// Address the wire front-end binds to.
    pub listen_address: String,
    /// Expected period between heartbeats, in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Silence before a healthy service is degraded; derived when unset.
    pub degraded_after_ms: Option<u64>,
    /// Silence before a degraded service is unhealthy; derived when unset.
    pub unhealthy_after_ms: Option<u64>,
    /// Time spent unhealthy before eviction; derived when unset.
    pub eviction_after_ms: Option<u64>,
    /// Wait for a first heartbeat before eviction; derived when unset.
    pub registration_timeout_ms: Option<u64>,
    /// Liveness sweep cadence; defaults to the heartbeat interval.
    pub sweep_interval_ms: Option<u64>,
    /// Invocation timeout used when the caller supplies none.
    pub invocation_timeout_ms: u64,
    /// Concurrent invocations allowed per service.
    pub max_inflight_per_service: usize,
    /// Latency samples kept per service.
    pub latency_window: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:50051".to_owned(),
            heartbeat_interval_ms: 10_000,
            degraded_after_ms: None,
            unhealthy_after_ms: None,
            eviction_after_ms: None,
            registration_timeout_ms: None,
            sweep_interval_ms: None,
            invocation_timeout_ms: 5_000,
            max_inflight_per_service: DEFAULT_MAX_INFLIGHT_PER_SERVICE,
            latency_window: DEFAULT_LATENCY_WINDOW,
        }
    }
}

impl BrokerConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is malformed or the result
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is malformed or the result
    /// fails validation.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            listen_address: lookup(&env_key("LISTEN_ADDRESS"))
                .unwrap_or(defaults.listen_address),
            heartbeat_interval_ms: parse_var(&lookup, "HEARTBEAT_INTERVAL_MS")?
                .unwrap_or(defaults.heartbeat_interval_ms),
            degraded_after_ms: parse_var(&lookup, "DEGRADED_AFTER_MS")?,
            unhealthy_after_ms: parse_var(&lookup, "UNHEALTHY_AFTER_MS")?,
            eviction_after_ms: parse_var(&lookup, "EVICTION_AFTER_MS")?,
            registration_timeout_ms: parse_var(&lookup, "REGISTRATION_TIMEOUT_MS")?,
            sweep_interval_ms: parse_var(&lookup, "SWEEP_INTERVAL_MS")?,
            invocation_timeout_ms: parse_var(&lookup, "INVOCATION_TIMEOUT_MS")?
                .unwrap_or(defaults.invocation_timeout_ms),
            max_inflight_per_service: parse_var(&lookup, "MAX_INFLIGHT_PER_SERVICE")?
                .unwrap_or(defaults.max_inflight_per_service),
            latency_window: parse_var(&lookup, "LATENCY_WINDOW")?
                .unwrap_or(defaults.latency_window),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document is malformed or fails
    /// validation.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, is malformed, or
    /// fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path)?;
        Self::from_toml_str(&document)
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unparsable listen address,
    /// zero durations or limits, or liveness thresholds that do not
    /// increase.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_socket_addr()?;

        let durations = [
            ("heartbeat_interval_ms", Some(self.heartbeat_interval_ms)),
            ("degraded_after_ms", self.degraded_after_ms),
            ("unhealthy_after_ms", self.unhealthy_after_ms),
            ("eviction_after_ms", self.eviction_after_ms),
            ("registration_timeout_ms", self.registration_timeout_ms),
            ("sweep_interval_ms", self.sweep_interval_ms),
            ("invocation_timeout_ms", Some(self.invocation_timeout_ms)),
        ];
        if let Some((key, _)) = durations.iter().find(|(_, value)| *value == Some(0)) {
            return Err(ConfigError::Invalid(format!("{key} must be greater than 0")));
        }
        let limits = [
            ("max_inflight_per_service", self.max_inflight_per_service),
            ("latency_window", self.latency_window),
        ];
        if let Some((key, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{key} must be greater than 0")));
        }

        let policy = self.liveness_policy();
        if policy.degraded_after >= policy.unhealthy_after {
            return Err(ConfigError::Invalid(
                "degraded_after_ms must be less than unhealthy_after_ms".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the listen address as a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn listen_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_address.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "listen_address '{}' is not a socket address",
                self.listen_address
            ))
        })
    }

    /// Resolves liveness thresholds, deriving unset ones from the interval.
    #[must_use]
    pub fn liveness_policy(&self) -> LivenessPolicy {
        let derived = LivenessPolicy::from_interval(Duration::from_millis(self.heartbeat_interval_ms));
        LivenessPolicy {
            heartbeat_interval: derived.heartbeat_interval,
            degraded_after: self
                .degraded_after_ms
                .map_or(derived.degraded_after, Duration::from_millis),
            unhealthy_after: self
                .unhealthy_after_ms
                .map_or(derived.unhealthy_after, Duration::from_millis),
            eviction_after: self
                .eviction_after_ms
                .map_or(derived.eviction_after, Duration::from_millis),
            registration_timeout: self
                .registration_timeout_ms
                .map_or(derived.registration_timeout, Duration::from_millis),
        }
    }

    /// Returns the liveness sweep cadence.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.unwrap_or(self.heartbeat_interval_ms))
    }

    /// Returns the default invocation timeout.
    #[must_use]
    pub const fn invocation_timeout(&self) -> Duration {
        Duration::from_millis(self.invocation_timeout_ms)
    }
}

fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}{suffix}")
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    suffix: &str,
) -> Result<Option<T>, ConfigError> {
    let key = env_key(suffix);
    let Some(raw) = lookup(&key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidVariable { key, value: raw })
}
