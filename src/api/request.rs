//! Chat Request
//!
//! The single outbound message sent once per question.

use crate::config::ChatConfig;
use serde::{Deserialize, Serialize};

/// User id sent with every request
pub const DEFAULT_UID: &str = "123456";

/// Outbound chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub header: RequestHeader,
    pub parameter: RequestParameter,
    pub payload: RequestPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestHeader {
    pub app_id: String,
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestParameter {
    pub chat: ChatParameters,
}

/// Model and sampling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatParameters {
    /// Model domain tag, e.g. "general"
    pub domain: String,

    /// Sampling threshold in [0, 1]
    pub temperature: f64,

    /// Maximum answer length in tokens
    pub max_tokens: u32,

    /// Candidate pool size in [1, 6]
    pub top_k: u32,

    /// Conversation id; always empty since every request is single-turn
    pub chat_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPayload {
    pub message: RequestMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMessage {
    pub text: Vec<RequestText>,
}

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestText {
    /// Always "user" for outbound turns
    pub role: String,
    pub content: String,
}

impl ChatRequest {
    /// Wrap a single question with the header and parameters from `config`
    pub fn new(app_id: &str, config: &ChatConfig, question: &str) -> Self {
        Self {
            header: RequestHeader {
                app_id: app_id.to_string(),
                uid: DEFAULT_UID.to_string(),
            },
            parameter: RequestParameter {
                chat: ChatParameters {
                    domain: config.version().domain().to_string(),
                    temperature: config.temperature(),
                    max_tokens: config.max_tokens(),
                    top_k: config.top_k(),
                    chat_id: String::new(),
                },
            },
            payload: RequestPayload {
                message: RequestMessage {
                    text: vec![RequestText {
                        role: "user".to_string(),
                        content: question.to_string(),
                    }],
                },
            },
        }
    }

    /// The question carried by this request
    pub fn question(&self) -> Option<&str> {
        self.payload.message.text.first().map(|t| t.content.as_str())
    }
}
