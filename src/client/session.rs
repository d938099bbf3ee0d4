//! Chat Session
//!
//! [`ChatClient`] answers one question at a time. Each question gets its own
//! connection, which is closed before control returns to the caller.

use crate::api::{Answer, AnswerAccumulator, ChatRequest, Fragment, ResponseFrame};
use crate::client::auth::{Authenticator, Credentials};
use crate::client::connection::Connection;
use crate::config::{ApiVersion, ChatConfig, ChatSettings, ConfigLoader};
use crate::error::{ChatError, Result};
use async_stream::stream;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::io::Write;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Destination for answer text
pub type Output = Box<dyn Write + Send>;

/// Fragments of one answer, ending after the terminal fragment or the first error
pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<Fragment>> + Send>>;

/// Marks a question as in flight; cleared when dropped
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Streaming chat client
pub struct ChatClient {
    authenticator: Authenticator,
    config: ChatConfig,
    output: Mutex<Output>,
    answering: Arc<AtomicBool>,
}

impl ChatClient {
    /// Create a client with default settings, writing answers to stderr
    pub fn new(credentials: Credentials) -> Self {
        Self::builder(credentials).build()
    }

    pub fn builder(credentials: Credentials) -> ChatClientBuilder {
        ChatClientBuilder::new(credentials)
    }

    /// Credentials from the environment, settings from the default config files
    pub fn from_env() -> Result<Self> {
        let credentials = Credentials::from_env()?;
        let config = ConfigLoader::new()?.into_config();
        Ok(Self::builder(credentials).config(config).build())
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        self.authenticator.credentials()
    }

    /// Whether a question is currently being answered
    pub fn is_answering(&self) -> bool {
        self.answering.load(Ordering::Acquire)
    }

    /// Ask a question, writing the answer to the output as it arrives.
    ///
    /// An empty question or a call while another is in flight is reported to the
    /// output and returns `Ok(())` without connecting.
    pub async fn ask(&self, question: &str) -> Result<()> {
        let mut fragments = match self.stream(question).await {
            Ok(fragments) => fragments,
            Err(e) if e.is_soft() => {
                tracing::warn!(reason = %e, "question rejected");
                self.write_output(&format!("{}\n", e));
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            self.write_output(&fragment.content);
        }

        Ok(())
    }

    /// Ask a question and collect the whole answer. Soft rejections are returned as errors.
    pub async fn complete(&self, question: &str) -> Result<Answer> {
        let mut fragments = self.stream(question).await?;
        let mut acc = AnswerAccumulator::new();

        while let Some(fragment) = fragments.next().await {
            acc.process_fragment(&fragment?);
        }

        Ok(acc.into_answer())
    }

    /// Ask a question and return its fragments as a stream.
    ///
    /// Fails with [`ChatError::Busy`] or [`ChatError::EmptyQuestion`] before connecting.
    /// The client stays busy until the stream finishes or is dropped.
    pub async fn stream(&self, question: &str) -> Result<AnswerStream> {
        let guard = InFlightGuard::acquire(&self.answering).ok_or(ChatError::Busy)?;

        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }

        let url = self.authenticator.signed_url(&self.config.base_url())?;
        let mut conn = Connection::open(&url, self.config.read_timeout()).await?;

        let request = ChatRequest::new(self.credentials().app_id(), &self.config, question);
        conn.send_json(&request).await?;
        tracing::debug!(
            domain = %request.parameter.chat.domain,
            max_tokens = request.parameter.chat.max_tokens,
            "request sent"
        );

        Ok(Box::pin(read_fragments(conn, guard)))
    }

    fn write_output(&self, text: &str) {
        let mut output = self.output.lock();
        let result = output.write_all(text.as_bytes()).and_then(|_| output.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to write answer output");
        }
    }
}

/// Read frames until the terminal one, then close the connection
fn read_fragments(
    mut conn: Connection,
    guard: InFlightGuard,
) -> impl Stream<Item = Result<Fragment>> + Send {
    stream! {
        let _guard = guard;

        loop {
            let text = match conn.recv_text().await {
                Ok(Some(text)) => text,
                Ok(None) => {
                    yield Err(ChatError::Transport(
                        "connection closed before the final frame".to_string(),
                    ));
                    break;
                }
                Err(e) => {
                    yield Err(e);
                    break;
                }
            };

            match ResponseFrame::parse(&text).and_then(ResponseFrame::into_fragment) {
                Ok(fragment) => {
                    tracing::debug!(
                        sid = %fragment.sid,
                        seq = fragment.seq,
                        status = fragment.status,
                        "frame received"
                    );
                    let done = fragment.is_terminal();
                    if done {
                        if let Some(usage) = fragment.usage {
                            tracing::info!(
                                sid = %fragment.sid,
                                prompt_tokens = usage.prompt_tokens,
                                completion_tokens = usage.completion_tokens,
                                total_tokens = usage.total_tokens,
                                "answer complete"
                            );
                        }
                    }
                    yield Ok(fragment);
                    if done {
                        break;
                    }
                }
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }

        conn.close().await;
    }
}

/// Builder for [`ChatClient`]. Options apply in call order; invalid values are ignored.
pub struct ChatClientBuilder {
    credentials: Credentials,
    config: ChatConfig,
    output: Option<Output>,
}

impl ChatClientBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            config: ChatConfig::default(),
            output: None,
        }
    }

    /// Replace all settings at once
    pub fn config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    /// Apply settings read from a file
    pub fn settings(mut self, settings: &ChatSettings) -> Self {
        settings.apply_to(&mut self.config);
        self
    }

    pub fn version(mut self, version: ApiVersion) -> Self {
        self.config.set_version(version);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.config.set_temperature(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.set_max_tokens(max_tokens);
        self
    }

    pub fn top_k(mut self, top_k: u32) -> Self {
        self.config.set_top_k(top_k);
        self
    }

    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.config.set_endpoint(endpoint);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.set_read_timeout(Some(timeout));
        self
    }

    /// Where answer text is written (default: stderr)
    pub fn output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    pub fn build(self) -> ChatClient {
        ChatClient {
            authenticator: Authenticator::new(self.credentials),
            config: self.config,
            output: Mutex::new(self.output.unwrap_or_else(|| Box::new(std::io::stderr()))),
            answering: Arc::new(AtomicBool::new(false)),
        }
    }
}
