//! Response Frames
//!
//! Inbound frames streamed back for a question. Every frame carries a status;
//! [`TERMINAL_STATUS`] marks the last one.

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};

/// Header status of the final frame of an answer
pub const TERMINAL_STATUS: i64 = 2;

/// One decoded inbound frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub header: ResponseHeader,

    #[serde(default)]
    pub payload: ResponsePayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseHeader {
    /// 0 on success, otherwise a server error code
    #[serde(default)]
    pub code: i64,

    #[serde(default)]
    pub message: String,

    /// Session id assigned by the server
    #[serde(default)]
    pub sid: String,

    /// 0 first frame, 1 continuing, 2 final
    #[serde(default)]
    pub status: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
    #[serde(default)]
    pub choices: Choices,

    /// Only present on the final frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choices {
    #[serde(default)]
    pub status: i64,

    #[serde(default)]
    pub seq: i64,

    #[serde(default)]
    pub text: Vec<ChoiceText>,
}

/// A fragment of answer text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceText {
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub index: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub text: TokenUsage,
}

/// Token accounting, informational only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub question_tokens: u32,

    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}

/// The part of a frame handed to callers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// Answer text; empty when the frame carried no choice
    pub content: String,

    pub role: String,

    /// Position of this frame in the answer
    pub seq: i64,

    /// Header status of the frame this came from
    pub status: i64,

    /// Session id assigned by the server
    pub sid: String,

    /// Token usage, usually only on the final fragment
    pub usage: Option<TokenUsage>,
}

impl Fragment {
    pub fn is_terminal(&self) -> bool {
        self.status == TERMINAL_STATUS
    }
}

impl ResponseFrame {
    /// Decode a frame from its JSON text
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            ChatError::Decode(format!("{}. Data: {}", e, &text[..floor_boundary(text, 200)]))
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.header.status == TERMINAL_STATUS
    }

    /// Content of the first text choice. Additional choices are not forwarded.
    pub fn first_text(&self) -> Option<&ChoiceText> {
        self.payload.choices.text.first()
    }

    /// Fail on a server-side error code, otherwise produce the fragment for this frame
    pub fn into_fragment(self) -> Result<Fragment> {
        if self.header.code != 0 {
            return Err(ChatError::Api {
                code: self.header.code,
                message: self.header.message,
                sid: self.header.sid,
            });
        }

        let (content, role) = match self.payload.choices.text.into_iter().next() {
            Some(text) => (text.content, text.role),
            None => (String::new(), String::new()),
        };

        Ok(Fragment {
            content,
            role,
            seq: self.payload.choices.seq,
            status: self.header.status,
            sid: self.header.sid,
            usage: self.payload.usage.map(|u| u.text),
        })
    }
}

/// Largest char boundary at or below `max`
fn floor_boundary(text: &str, max: usize) -> usize {
    if text.len() <= max {
        return text.len();
    }
    (0..=max).rev().find(|&i| text.is_char_boundary(i)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_frame() {
        let json = r#"{
            "header": {"code": 0, "message": "Success", "sid": "cht000cb087@dx18", "status": 2},
            "payload": {
                "choices": {"status": 2, "seq": 3, "text": [{"content": "done.", "role": "assistant", "index": 0}]},
                "usage": {"text": {"question_tokens": 4, "prompt_tokens": 5, "completion_tokens": 9, "total_tokens": 14}}
            }
        }"#;

        let frame = ResponseFrame::parse(json).unwrap();
        assert!(frame.is_terminal());
        assert_eq!(frame.first_text().unwrap().content, "done.");

        let fragment = frame.into_fragment().unwrap();
        assert_eq!(fragment.content, "done.");
        assert_eq!(fragment.role, "assistant");
        assert_eq!(fragment.seq, 3);
        assert_eq!(fragment.sid, "cht000cb087@dx18");
        assert!(fragment.is_terminal());
        assert_eq!(fragment.usage.unwrap().total_tokens, 14);
    }

    #[test]
    fn test_parse_in_progress_frame_without_usage() {
        let json = r#"{"header":{"code":0,"message":"Success","sid":"s","status":1},
            "payload":{"choices":{"status":1,"seq":1,"text":[{"content":"Hi","role":"assistant","index":0}]}}}"#;

        let frame = ResponseFrame::parse(json).unwrap();
        assert!(!frame.is_terminal());
        let fragment = frame.into_fragment().unwrap();
        assert_eq!(fragment.content, "Hi");
        assert!(fragment.usage.is_none());
    }

    #[test]
    fn test_only_first_choice_is_forwarded() {
        let json = r#"{"header":{"code":0,"status":0},
            "payload":{"choices":{"text":[{"content":"a"},{"content":"b"}]}}}"#;

        let fragment = ResponseFrame::parse(json).unwrap().into_fragment().unwrap();
        assert_eq!(fragment.content, "a");
    }

    #[test]
    fn test_error_frame_becomes_api_error() {
        let json = r#"{"header":{"code":10163,"message":"request params invalid","sid":"x","status":2}}"#;

        let err = ResponseFrame::parse(json).unwrap().into_fragment().unwrap_err();
        match err {
            ChatError::Api { code, message, sid } => {
                assert_eq!(code, 10163);
                assert_eq!(message, "request params invalid");
                assert_eq!(sid, "x");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_choice_list_yields_empty_content() {
        let json = r#"{"header":{"code":0,"status":2},"payload":{"choices":{"text":[]}}}"#;

        let fragment = ResponseFrame::parse(json).unwrap().into_fragment().unwrap();
        assert_eq!(fragment.content, "");
        assert!(fragment.is_terminal());
    }

    #[test]
    fn test_missing_code_defaults_to_success() {
        let json = r#"{"header":{"status":2,"sid":"x"},
            "payload":{"choices":{"text":[{"content":"bye","role":"assistant","index":0}]}}}"#;

        let frame = ResponseFrame::parse(json).unwrap();
        assert_eq!(frame.header.code, 0);
        let fragment = frame.into_fragment().unwrap();
        assert_eq!(fragment.content, "bye");
        assert!(fragment.is_terminal());
    }

    #[test]
    fn test_malformed_frame_is_decode_error() {
        let err = ResponseFrame::parse("{\"header\": ").unwrap_err();
        assert!(matches!(err, ChatError::Decode(_)));
    }

    #[test]
    fn test_decode_error_truncates_on_char_boundary() {
        let junk = "é".repeat(300);
        let err = ResponseFrame::parse(&junk).unwrap_err();
        assert!(matches!(err, ChatError::Decode(_)));
    }
}
