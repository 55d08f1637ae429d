//! Wire shapes for the streaming search channel.
//!
//! The backend speaks JSON text frames: one request envelope in, a sequence
//! of typed messages out. `end_stream` is the terminal success marker; an
//! `error` message short-circuits the session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::SearchResult;

/// Action name the backend routes recommendation requests by.
pub const RECOMMENDATIONS_ACTION: &str = "getGrantRecommendations";

/// Request envelope sent once after connecting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRequest {
    pub action: String,
    pub data: StreamRequestData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRequestData {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Value>,
}

impl StreamRequest {
    pub fn recommendations(
        query: impl Into<String>,
        user_id: Option<String>,
        session_id: Option<String>,
        preferences: Option<Value>,
    ) -> Self {
        Self {
            action: RECOMMENDATIONS_ACTION.to_string(),
            data: StreamRequestData {
                query: query.into(),
                user_id,
                session_id,
                preferences,
            },
        }
    }
}

/// Typed messages received on the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// A batch of scored recommendations; may arrive more than once.
    GrantRecommendations {
        #[serde(default)]
        grants: Vec<SearchResult>,
        #[serde(default)]
        suggested_questions: Vec<String>,
    },
    /// Backend-side failure. Terminal; the channel is closed on receipt.
    Error {
        #[serde(default)]
        message: String,
    },
    /// Terminal success marker.
    EndStream,
}

pub fn encode_request(req: &StreamRequest) -> Result<String, serde_json::Error> {
    serde_json::to_string(req)
}

pub fn decode_message(text: &str) -> Result<StreamMessage, serde_json::Error> {
    serde_json::from_str(text)
}
