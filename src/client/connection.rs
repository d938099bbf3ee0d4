//! WebSocket Connection
//!
//! One connection per question: open, send the request, read frames, close.

use crate::error::{ChatError, Result};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// An open WebSocket connection to the chat service
pub struct Connection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,

    /// Receive timeout per frame; `None` waits indefinitely
    read_timeout: Option<Duration>,
}

impl Connection {
    /// Perform the WebSocket handshake against a signed URL
    pub async fn open(url: &str, read_timeout: Option<Duration>) -> Result<Self> {
        let (ws, response) = connect_async(url).await.map_err(|e| match e {
            tungstenite::Error::Http(resp) => ChatError::Connect(format!(
                "handshake rejected with status {}",
                resp.status()
            )),
            other => ChatError::Connect(other.to_string()),
        })?;

        tracing::debug!(status = %response.status(), "websocket connected");

        Ok(Self { ws, read_timeout })
    }

    /// Send a value as a single JSON text message
    pub async fn send_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)
            .map_err(|e| ChatError::Transport(format!("failed to encode message: {}", e)))?;
        self.ws.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Next text message. `None` once the peer has closed the connection.
    pub async fn recv_text(&mut self) -> Result<Option<String>> {
        loop {
            let next = match self.read_timeout {
                Some(limit) => tokio::time::timeout(limit, self.ws.next())
                    .await
                    .map_err(|_| ChatError::Timeout(limit))?,
                None => self.ws.next().await,
            };

            match next {
                None | Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Binary(bytes))) => {
                    return String::from_utf8(bytes)
                        .map(Some)
                        .map_err(|e| ChatError::Decode(format!("binary frame is not UTF-8: {}", e)));
                }
                // Ping/pong are answered by tungstenite
                Some(Ok(_)) => continue,
            }
        }
    }

    /// Close the connection, ignoring errors from a peer that already went away
    pub async fn close(mut self) {
        if let Err(e) = self.ws.close(None).await {
            tracing::debug!(error = %e, "websocket close failed");
        }
    }
}
