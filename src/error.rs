//! xfchat Error Types
//!
//! Error handling for the chat client. Soft usage errors (`EmptyQuestion`, `Busy`)
//! are reported to the output sink by [`crate::ChatClient::ask`] and only surface as
//! values from [`crate::ChatClient::stream`].

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Main error type for chat operations
#[derive(Debug, Error)]
pub enum ChatError {
    /// Configuration errors (invalid endpoint, unreadable settings file, missing credentials)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The question was empty after trimming
    #[error("please enter your question")]
    EmptyQuestion,

    /// Another question is still being answered by this client
    #[error("please wait")]
    Busy,

    /// Establishing the WebSocket connection failed
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Sending or receiving a message failed mid-session
    #[error("Transport error: {0}")]
    Transport(String),

    /// An inbound frame could not be decoded
    #[error("Failed to decode frame: {0}")]
    Decode(String),

    /// The server answered with a non-zero status code
    #[error("API error {code} (sid {sid}): {message}")]
    Api {
        code: i64,
        message: String,
        sid: String,
    },

    /// No frame arrived within the configured read timeout
    #[error("Timed out waiting for frame after {0:?}")]
    Timeout(std::time::Duration),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Decode(format!("JSON parsing error: {}", err))
    }
}

impl From<tungstenite::Error> for ChatError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::Io(e) => ChatError::Transport(format!("socket IO: {}", e)),
            other => ChatError::Transport(other.to_string()),
        }
    }
}

impl ChatError {
    /// Whether this is a usage error reported to the sink rather than returned
    pub fn is_soft(&self) -> bool {
        matches!(self, ChatError::EmptyQuestion | ChatError::Busy)
    }
}

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_errors_render_sink_messages() {
        assert_eq!(ChatError::EmptyQuestion.to_string(), "please enter your question");
        assert_eq!(ChatError::Busy.to_string(), "please wait");
        assert!(ChatError::Busy.is_soft());
        assert!(!ChatError::Decode("x".into()).is_soft());
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(ChatError::from(err), ChatError::Decode(_)));
    }

    #[test]
    fn test_api_error_display() {
        let err = ChatError::Api {
            code: 10013,
            message: "input content audit failed".to_string(),
            sid: "cht000b@dx18".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error 10013 (sid cht000b@dx18): input content audit failed"
        );
    }
}
