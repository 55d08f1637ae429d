//! REST variant of the remote search client.
//!
//! One authenticated POST per invocation. Non-2xx responses are failures and
//! are not retried automatically; the user retries by re-triggering search.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{AuthProvider, RemoteResponse, RemoteSearch, SearchError, SearchFuture};
use crate::model::SearchResult;
use crate::search::normalize::NormalizedQuery;

/// Request timeout; a hung request blocks only the session's in-flight
/// state, never the caller's thread.
const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preferences: Option<&'a Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    search_time_ms: u64,
}

struct Inner {
    endpoint: String,
    auth: Arc<dyn AuthProvider>,
    http: reqwest::Client,
    user_id: Option<String>,
    session_id: Option<String>,
    preferences: Option<Value>,
}

/// HTTP client for the grant recommendations endpoint.
pub struct RestSearchClient {
    inner: Arc<Inner>,
}

impl RestSearchClient {
    pub fn new(
        endpoint: impl Into<String>,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(concat!("nofos/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SearchError::Transport(format!("building http client: {e}")))?;
        Ok(Self {
            inner: Arc::new(Inner {
                endpoint: endpoint.into().trim_end_matches('/').to_string(),
                auth,
                http,
                user_id: None,
                session_id: None,
                preferences: None,
            }),
        })
    }

    pub fn with_identity(self, user_id: Option<String>, session_id: Option<String>) -> Self {
        let mut inner = self.into_inner();
        inner.user_id = user_id;
        inner.session_id = session_id;
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn with_preferences(self, preferences: Option<Value>) -> Self {
        let mut inner = self.into_inner();
        inner.preferences = preferences;
        Self {
            inner: Arc::new(inner),
        }
    }

    fn into_inner(self) -> Inner {
        // Builder methods run before the client is shared.
        Arc::try_unwrap(self.inner).unwrap_or_else(|shared| Inner {
            endpoint: shared.endpoint.clone(),
            auth: Arc::clone(&shared.auth),
            http: shared.http.clone(),
            user_id: shared.user_id.clone(),
            session_id: shared.session_id.clone(),
            preferences: shared.preferences.clone(),
        })
    }
}

impl Inner {
    async fn request(&self, query: String) -> Result<RemoteResponse, SearchError> {
        let token = self.auth.bearer_token()?;
        let url = format!("{}/grant-recommendations", self.endpoint);
        let body = RecommendationRequest {
            query: &query,
            user_id: self.user_id.as_deref(),
            session_id: self.session_id.as_deref(),
            preferences: self.preferences.as_ref(),
        };

        debug!(url = %url, query = %query, "dispatching recommendation request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Transport(format!(
                "search service returned {status}"
            )));
        }

        let parsed: RecommendationResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Protocol(format!("parsing response: {e}")))?;

        debug!(
            query = %query,
            result_count = parsed.results.len(),
            search_time_ms = parsed.search_time_ms,
            "recommendation request resolved"
        );
        Ok(RemoteResponse {
            results: parsed.results,
            search_time_ms: parsed.search_time_ms,
            suggested_questions: Vec::new(),
        })
    }
}

impl RemoteSearch for RestSearchClient {
    fn search(&self, query: &NormalizedQuery) -> SearchFuture {
        let inner = Arc::clone(&self.inner);
        let query = query.as_str().to_string();
        Box::pin(async move { inner.request(query).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::StaticAuth;

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let client =
            RestSearchClient::new("https://api.example.gov/", Arc::new(StaticAuth("t".into())))
                .unwrap();
        assert_eq!(client.inner.endpoint, "https://api.example.gov");
    }

    #[test]
    fn request_body_omits_absent_identity() {
        let body = RecommendationRequest {
            query: "water",
            user_id: None,
            session_id: None,
            preferences: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"query":"water"}"#);
    }

    #[test]
    fn response_parses_camel_case_fields() {
        let parsed: RecommendationResponse = serde_json::from_str(
            r#"{"results":[{"name":"A","score":1.0,"source":"agency","reason":""}],
                "query":"water","searchTimeMs":210}"#,
        )
        .unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.search_time_ms, 210);
    }

    #[test]
    fn identity_builder_lands_in_request_shape() {
        let client = RestSearchClient::new("https://api.example.gov", Arc::new(StaticAuth("t".into())))
            .unwrap()
            .with_identity(Some("u-1".into()), Some("s-1".into()));
        assert_eq!(client.inner.user_id.as_deref(), Some("u-1"));
        assert_eq!(client.inner.session_id.as_deref(), Some("s-1"));
    }
}
