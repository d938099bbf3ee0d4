//! Client Module
//!
//! Connection signing, WebSocket transport, and the chat session.

pub mod auth;
pub mod connection;
pub mod session;

pub use auth::{Authenticator, Credentials};
pub use connection::Connection;
pub use session::{AnswerStream, ChatClient, ChatClientBuilder, Output};
