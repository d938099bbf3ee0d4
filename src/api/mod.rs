//! API Module
//!
//! Wire types for the chat protocol and answer accumulation.

pub mod request;
pub mod response;
pub mod streaming;

pub use request::{
    ChatParameters, ChatRequest, RequestHeader, RequestMessage, RequestParameter, RequestPayload,
    RequestText, DEFAULT_UID,
};
pub use response::{
    ChoiceText, Choices, Fragment, ResponseFrame, ResponseHeader, ResponsePayload, TokenUsage,
    Usage, TERMINAL_STATUS,
};
pub use streaming::{Answer, AnswerAccumulator};
