//! xfchat - Streaming chat client for the Spark WebSocket API
//!
//! Every question opens its own HMAC-authenticated WebSocket connection, sends a
//! single-turn request, and streams answer fragments back until the server marks
//! the answer complete.
//!
//! ```no_run
//! use xfchat::{ApiVersion, ChatClient, Credentials};
//!
//! # async fn run() -> xfchat::Result<()> {
//! let client = ChatClient::builder(Credentials::new("app-id", "api-key", "api-secret"))
//!     .version(ApiVersion::V2)
//!     .temperature(0.7)
//!     .output(std::io::stdout())
//!     .build();
//!
//! client.ask("What is the capital of France?").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;

pub use api::{Answer, ChatRequest, Fragment, ResponseFrame, TokenUsage};
pub use client::{AnswerStream, Authenticator, ChatClient, ChatClientBuilder, Credentials, Output};
pub use config::{ApiVersion, ChatConfig, ChatSettings, ConfigLoader};
pub use error::{ChatError, Result};
