//! Streaming variant of the remote search client.
//!
//! Opens a websocket session, sends one request envelope, then runs a finite
//! accumulation protocol: batches are collected until a terminal message
//! (`end_stream`) resolves the call, or an `error` message short-circuits it.
//! The channel is closed on every resolution path.

use std::sync::Arc;
use std::time::Instant;

use futures_util::{SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::debug;

use super::protocol::{StreamMessage, StreamRequest, decode_message, encode_request};
use super::{AuthProvider, RemoteResponse, RemoteSearch, SearchError, SearchFuture};
use crate::model::SearchResult;
use crate::search::normalize::NormalizedQuery;

/// Accumulated output of one streaming session.
#[derive(Debug, Default)]
pub struct StreamOutcome {
    pub grants: Vec<SearchResult>,
    pub suggested_questions: Vec<String>,
}

/// Drain typed messages until a terminal one.
///
/// Resolves exactly once: `end_stream` yields the accumulated outcome, an
/// `error` message or transport failure yields the error, and a channel that
/// closes without a terminal message is a protocol violation. Control frames
/// are ignored; the caller owns channel teardown.
pub async fn collect_recommendations<S>(channel: &mut S) -> Result<StreamOutcome, SearchError>
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    let mut outcome = StreamOutcome::default();
    while let Some(frame) = channel.next().await {
        let frame = frame.map_err(|e| SearchError::Transport(format!("stream error: {e}")))?;
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Ping/pong and binary frames are not part of the protocol.
            _ => continue,
        };
        match decode_message(text.as_str()) {
            Ok(StreamMessage::GrantRecommendations {
                grants,
                suggested_questions,
            }) => {
                outcome.grants.extend(grants);
                outcome.suggested_questions.extend(suggested_questions);
            }
            Ok(StreamMessage::Error { message }) => {
                return Err(SearchError::Transport(if message.is_empty() {
                    "search service reported an error".to_string()
                } else {
                    message
                }));
            }
            Ok(StreamMessage::EndStream) => {
                debug!(
                    grants = outcome.grants.len(),
                    questions = outcome.suggested_questions.len(),
                    "stream completed"
                );
                return Ok(outcome);
            }
            Err(e) => {
                return Err(SearchError::Protocol(format!("undecodable message: {e}")));
            }
        }
    }
    Err(SearchError::Protocol(
        "channel closed before end_stream".to_string(),
    ))
}

/// Connection URL with the bearer token as an `Authorization` query
/// parameter, per the backend's websocket auth scheme.
fn connect_url(endpoint: &str, token: &str) -> String {
    let sep = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{sep}Authorization={}", urlencoding::encode(token))
}

/// Websocket client for the recommendations backend.
pub struct StreamingSearchClient {
    endpoint: String,
    auth: Arc<dyn AuthProvider>,
    user_id: Option<String>,
    session_id: Option<String>,
    preferences: Option<Value>,
}

impl StreamingSearchClient {
    pub fn new(endpoint: impl Into<String>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth,
            user_id: None,
            session_id: None,
            preferences: None,
        }
    }

    pub fn with_identity(mut self, user_id: Option<String>, session_id: Option<String>) -> Self {
        self.user_id = user_id;
        self.session_id = session_id;
        self
    }

    pub fn with_preferences(mut self, preferences: Option<Value>) -> Self {
        self.preferences = preferences;
        self
    }

    async fn run(
        endpoint_url: String,
        request: StreamRequest,
    ) -> Result<StreamOutcome, SearchError> {
        let (mut channel, _response) = connect_async(&endpoint_url)
            .await
            .map_err(|e| SearchError::Transport(format!("websocket connect failed: {e}")))?;

        let payload = encode_request(&request)
            .map_err(|e| SearchError::Protocol(format!("encoding request: {e}")))?;
        if let Err(e) = channel.send(Message::text(payload)).await {
            let _ = channel.close(None).await;
            return Err(SearchError::Transport(format!("sending request: {e}")));
        }

        let outcome = collect_recommendations(&mut channel).await;
        // Teardown happens regardless of how the collection resolved.
        let _ = channel.close(None).await;
        outcome
    }
}

impl RemoteSearch for StreamingSearchClient {
    fn search(&self, query: &NormalizedQuery) -> SearchFuture {
        let request = StreamRequest::recommendations(
            query.as_str(),
            self.user_id.clone(),
            self.session_id.clone(),
            self.preferences.clone(),
        );
        let auth = Arc::clone(&self.auth);
        let endpoint = self.endpoint.clone();
        Box::pin(async move {
            let token = auth.bearer_token()?;
            let url = connect_url(&endpoint, &token);
            let started = Instant::now();
            let outcome = Self::run(url, request).await?;
            Ok(RemoteResponse {
                results: outcome.grants,
                search_time_ms: started.elapsed().as_millis() as u64,
                suggested_questions: outcome.suggested_questions,
            })
        })
    }
}
