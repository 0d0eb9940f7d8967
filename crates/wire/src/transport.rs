// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RPC Transport (C1): frames JSON messages over a single duplex WebSocket
//! connection. The transport does not interpret payloads or correlate
//! requests with responses — that is `runix-adapters`' job (C2).

use crate::message::RpcMessage;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect timed out")]
    ConnectTimeout,
    #[error("connection refused: {0}")]
    ConnectRefused(String),
    #[error("connection closed")]
    Closed,
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("malformed message: {0}")]
    Malformed(String),
}

/// A message arriving on the transport's read side, or a signal that the
/// connection has gone away (§4.1 "Failure model").
#[derive(Debug)]
pub enum TransportEvent {
    Message(RpcMessage),
    Disconnected,
}

/// One open duplex WebSocket connection to a driver process (§4.1).
///
/// `send` may be called concurrently with reads; the write half is
/// serialized behind an internal lock since "the client layer assigns a
/// locally unique id per request" but multiple requests can be in flight.
/// Reads are delivered through the `mpsc::Receiver<TransportEvent>` returned
/// by `open`, which a background task feeds until the socket closes or
/// produces malformed JSON.
pub struct WsTransport {
    write: Mutex<futures_util::stream::SplitSink<WebSocketStream<TcpStream>, WsMessage>>,
}

impl WsTransport {
    /// Open a WebSocket connection to `url` (expected `ws://host:port/...`),
    /// failing with `ConnectTimeout` if the peer does not accept within
    /// `deadline`, `ConnectRefused` otherwise (§4.1).
    pub async fn open(
        url: &str,
        deadline: Duration,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), TransportError> {
        let authority = parse_authority(url).ok_or_else(|| {
            TransportError::ConnectRefused(format!("invalid websocket url: {url}"))
        })?;

        let tcp = tokio::time::timeout(deadline, TcpStream::connect(&authority))
            .await
            .map_err(|_| TransportError::ConnectTimeout)?
            .map_err(|e| TransportError::ConnectRefused(e.to_string()))?;

        let (ws, _response) = tokio::time::timeout(deadline, tokio_tungstenite::client_async(url, tcp))
            .await
            .map_err(|_| TransportError::ConnectTimeout)?
            .map_err(|e| TransportError::ConnectRefused(e.to_string()))?;

        let (write, mut read) = ws.split();
        let (event_tx, event_rx) = mpsc::channel(256);

        tokio::spawn(async move {
            loop {
                match read.next().await {
                    Some(Ok(WsMessage::Text(text))) => match RpcMessage::from_json(&text) {
                        Ok(message) => {
                            if event_tx.send(TransportEvent::Message(message)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "malformed driver message, aborting connection");
                            let _ = event_tx.send(TransportEvent::Disconnected).await;
                            break;
                        }
                    },
                    Some(Ok(WsMessage::Close(_))) | None => {
                        let _ = event_tx.send(TransportEvent::Disconnected).await;
                        break;
                    }
                    Some(Ok(_)) => {} // Ping/Pong/Binary ignored — one JSON message per frame
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "driver transport error");
                        let _ = event_tx.send(TransportEvent::Disconnected).await;
                        break;
                    }
                }
            }
        });

        Ok((
            Self {
                write: Mutex::new(write),
            },
            event_rx,
        ))
    }

    pub async fn send(&self, message: &RpcMessage) -> Result<(), TransportError> {
        let text = message
            .to_json()
            .map_err(|e| TransportError::Malformed(e.to_string()))?;
        let mut write = self.write.lock().await;
        write
            .send(WsMessage::Text(text))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    pub async fn close(&self) -> Result<(), TransportError> {
        let mut write = self.write.lock().await;
        write
            .close()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

/// Strip the `ws://` scheme and path/query off a driver URL to get a
/// connectable `host:port` pair.
fn parse_authority(url: &str) -> Option<String> {
    let without_scheme = url.strip_prefix("ws://").or_else(|| url.strip_prefix("wss://"))?;
    let authority = without_scheme.split(['/', '?']).next()?;
    if authority.is_empty() {
        None
    } else {
        Some(authority.to_string())
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
