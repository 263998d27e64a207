//! Read-only resolution of intent requests against the registry.

use crate::matching::domain::{IntentRequest, MatchCandidate, MatchResult, evaluate_pattern};
use crate::registry::ports::{RegistryError, ServiceRegistryRepository};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned while resolving an intent.
#[derive(Debug, Error)]
pub enum MatchError {
    /// No matchable registration satisfied the request.
    #[error("no service matches action '{action}'")]
    NoMatch {
        /// Requested action.
        action: String,
    },
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RegistryError),
}

/// Result type for matching operations.
pub type MatchingResult<T> = Result<T, MatchError>;

/// Resolves requests to the best registration and pattern.
///
/// The engine never mutates the registry; it evaluates a snapshot taken by
/// one repository read, so concurrent registrations and heartbeats cannot
/// expose a partially updated index.
#[derive(Clone)]
pub struct MatchingEngine<R>
where
    R: ServiceRegistryRepository,
{
    repository: Arc<R>,
}

impl<R> MatchingEngine<R>
where
    R: ServiceRegistryRepository,
{
    /// Creates a matching engine over `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Resolves `request` to the top-ranked (registration, pattern) pair.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::NoMatch`] when no `Healthy` or `Degraded`
    /// registration has a pattern for the action whose constraints the
    /// request satisfies, or repository errors.
    pub async fn resolve(&self, request: &IntentRequest) -> MatchingResult<MatchResult> {
        let snapshot = self.repository.find_by_action(&request.action).await?;

        let winner = snapshot
            .iter()
            .filter(|registration| registration.is_matchable())
            .flat_map(|registration| {
                registration
                    .patterns_for(&request.action)
                    .filter(move |(index, pattern)| {
                        evaluate_pattern(pattern, &request.bound_parameters)
                            .inspect_err(|violation| {
                                tracing::debug!(
                                    service_id = %registration.id(),
                                    pattern_index = index,
                                    %violation,
                                    "pattern rejected request"
                                );
                            })
                            .is_ok()
                    })
                    .map(move |(index, pattern)| MatchCandidate::new(registration, index, pattern))
            })
            .min_by(MatchCandidate::rank);

        let Some(candidate) = winner else {
            tracing::info!(
                action = request.action.as_str(),
                candidates = snapshot.len(),
                "no service matched intent"
            );
            return Err(MatchError::NoMatch {
                action: request.action.clone(),
            });
        };

        let result = candidate.into_result();
        tracing::debug!(
            action = request.action.as_str(),
            service_id = %result.service_id,
            pattern_index = result.pattern_index,
            "resolved intent"
        );
        Ok(result)
    }
}
