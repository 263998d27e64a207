//! Broker-internal serving status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the broker itself can serve requests.
///
/// This reflects broker health only, never the health of individual
/// registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServingStatus {
    /// Accepting requests.
    Serving,
    /// Shutting down or unable to use its registry.
    NotServing,
}

impl ServingStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serving => "SERVING",
            Self::NotServing => "NOT_SERVING",
        }
    }
}

impl fmt::Display for ServingStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
