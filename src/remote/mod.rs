//! Remote AI search clients.
//!
//! Two transport variants implement the same seam:
//!
//! - [`rest`]: single authenticated POST against the recommendations endpoint.
//! - [`stream`]: websocket session accumulating typed messages until a
//!   terminal one ([`protocol`] defines the wire shapes).
//!
//! Both guarantee exactly one resolution per invocation and connection
//! teardown on every exit path. Loose remote shapes are validated here, at
//! the client boundary; ranking logic never sees partially-typed data.

pub mod protocol;
pub mod rest;
pub mod stream;

use std::future::Future;
use std::pin::Pin;

use crate::model::SearchResult;
use crate::search::normalize::NormalizedQuery;

/// Failure taxonomy for remote search. Failures are converted to the
/// session's `Failed` state at the orchestrator boundary; they never
/// propagate past it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// Token fetch failed. Surfaced as a generic unavailability message and
    /// not retried.
    #[error("search is currently unavailable: {0}")]
    AuthUnavailable(String),

    /// Non-2xx response, connect/send failure, or a streaming error message.
    #[error("search request failed: {0}")]
    Transport(String),

    /// Malformed or unexpected wire data.
    #[error("unexpected response from search service: {0}")]
    Protocol(String),
}

/// Normalized payload both transport variants resolve to.
#[derive(Debug, Clone, Default)]
pub struct RemoteResponse {
    pub results: Vec<SearchResult>,
    pub search_time_ms: u64,
    /// Follow-up prompts suggested by the agentic backend (streaming only).
    pub suggested_questions: Vec<String>,
}

pub type SearchFuture = Pin<Box<dyn Future<Output = Result<RemoteResponse, SearchError>> + Send>>;

/// The seam the orchestrator dispatches remote calls through. Dyn-compatible
/// so sessions can be wired to either transport, or to a scripted double in
/// tests.
pub trait RemoteSearch: Send + Sync {
    fn search(&self, query: &NormalizedQuery) -> SearchFuture;
}

/// External collaborator that produces bearer tokens. May fail; the failure
/// is propagated as [`SearchError::AuthUnavailable`].
pub trait AuthProvider: Send + Sync {
    fn bearer_token(&self) -> Result<String, SearchError>;
}

/// Stand-in used when no endpoint is configured. Resolves every call with an
/// empty result set, so sessions fall back to the local ordering.
pub struct OfflineRemote;

impl RemoteSearch for OfflineRemote {
    fn search(&self, query: &NormalizedQuery) -> SearchFuture {
        tracing::debug!(query = %query, "offline mode, skipping remote search");
        Box::pin(std::future::ready(Ok(RemoteResponse::default())))
    }
}

/// Fixed token, for wiring and tests.
pub struct StaticAuth(pub String);

impl AuthProvider for StaticAuth {
    fn bearer_token(&self) -> Result<String, SearchError> {
        Ok(self.0.clone())
    }
}

/// Reads the token from `NOFOS_AUTH_TOKEN` at call time.
pub struct EnvAuth;

impl AuthProvider for EnvAuth {
    fn bearer_token(&self) -> Result<String, SearchError> {
        dotenvy::var("NOFOS_AUTH_TOKEN")
            .map_err(|_| SearchError::AuthUnavailable("NOFOS_AUTH_TOKEN is not set".into()))
    }
}
