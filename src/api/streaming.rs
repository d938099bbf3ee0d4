//! Answer Accumulation
//!
//! Folds a stream of fragments into a complete answer.

use crate::api::response::{Fragment, TokenUsage};

/// A complete answer assembled from its fragments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answer {
    /// Concatenated answer text
    pub content: String,

    /// Session id assigned by the server
    pub sid: String,

    /// Token usage from the final fragment
    pub usage: Option<TokenUsage>,

    /// Number of fragments received
    pub fragments: usize,
}

/// Accumulator for streamed fragments
#[derive(Debug, Default)]
pub struct AnswerAccumulator {
    content: String,
    sid: Option<String>,
    usage: Option<TokenUsage>,
    fragments: usize,
    finished: bool,
}

impl AnswerAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a fragment
    pub fn process_fragment(&mut self, fragment: &Fragment) {
        // Store sid from first fragment
        if self.sid.is_none() && !fragment.sid.is_empty() {
            self.sid = Some(fragment.sid.clone());
        }

        if fragment.usage.is_some() {
            self.usage = fragment.usage;
        }

        self.content.push_str(&fragment.content);
        self.fragments += 1;

        if fragment.is_terminal() {
            self.finished = true;
        }
    }

    /// Whether the terminal fragment has been seen
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_answer(self) -> Answer {
        Answer {
            content: self.content,
            sid: self.sid.unwrap_or_default(),
            usage: self.usage,
            fragments: self.fragments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(content: &str, status: i64, usage: Option<TokenUsage>) -> Fragment {
        Fragment {
            content: content.to_string(),
            role: "assistant".to_string(),
            seq: 0,
            status,
            sid: "sid-1".to_string(),
            usage,
        }
    }

    #[test]
    fn test_accumulates_in_order() {
        let mut acc = AnswerAccumulator::new();
        acc.process_fragment(&fragment("Hi", 0, None));
        assert!(!acc.is_finished());
        assert_eq!(acc.content(), "Hi");

        let usage = TokenUsage {
            question_tokens: 1,
            prompt_tokens: 1,
            completion_tokens: 2,
            total_tokens: 3,
        };
        acc.process_fragment(&fragment(" there", 2, Some(usage)));
        assert!(acc.is_finished());

        let answer = acc.into_answer();
        assert_eq!(answer.content, "Hi there");
        assert_eq!(answer.sid, "sid-1");
        assert_eq!(answer.usage, Some(usage));
        assert_eq!(answer.fragments, 2);
    }

    #[test]
    fn test_empty_accumulator() {
        let answer = AnswerAccumulator::new().into_answer();
        assert_eq!(answer, Answer::default());
    }
}
