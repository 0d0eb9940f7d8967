// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver Client (C2): a typed wrapper around a single driver's [`WsTransport`].
//!
//! Owns request/response correlation by `id`, per-request timeouts, and
//! reconnect-with-backoff on transient loss. One client per driver process;
//! the Registry (C4) is the only thing that creates, shares, or closes one.

use parking_lot::Mutex as SyncMutex;
use runix_core::{DriverId, HealthStatus};
use runix_wire::{RpcError, RpcMessage, TransportError, TransportEvent, WsTransport};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,
    #[error("driver communication error: {0}")]
    DriverCommunication(String),
    #[error("initialize called more than once")]
    AlreadyInitialized,
    #[error("driver returned an error: {0:?}")]
    DriverError(RpcError),
    #[error("connect failed: {0}")]
    Connect(#[from] TransportError),
}

/// Reconnect backoff and per-request timeouts, threaded in explicitly by the
/// caller (the Registry) rather than read from global state.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub default_request_timeout: Duration,
    pub reconnect_backoff: Vec<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_request_timeout: Duration::from_secs(30),
            reconnect_backoff: vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
            ],
        }
    }
}

type PendingMap = Arc<SyncMutex<HashMap<String, oneshot::Sender<Result<RpcMessage, ClientError>>>>>;

struct Connection {
    transport: WsTransport,
    pending: PendingMap,
}

/// A live connection to one driver process, reached over its `ws://` URL.
pub struct DriverClient {
    driver_id: DriverId,
    url: String,
    config: ClientConfig,
    connection: tokio::sync::Mutex<Option<Connection>>,
    connected: Arc<AtomicBool>,
    next_id: AtomicU64,
    initialized: AtomicBool,
}

impl DriverClient {
    /// Open the transport and start the client. Does not call `initialize`.
    pub async fn connect(
        driver_id: DriverId,
        url: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let url = url.into();
        let connected = Arc::new(AtomicBool::new(false));
        let connection = open_connection(&url, config.default_request_timeout, connected.clone())
            .await?;
        connected.store(true, Ordering::SeqCst);
        Ok(Self {
            driver_id,
            url,
            config,
            connection: tokio::sync::Mutex::new(Some(connection)),
            connected,
            next_id: AtomicU64::new(1),
            initialized: AtomicBool::new(false),
        })
    }

    pub fn driver_id(&self) -> &DriverId {
        &self.driver_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// `capabilities() → {name, version, description, actions[], features[]}`.
    pub async fn capabilities(&self) -> Result<Value, ClientError> {
        self.call("capabilities", Value::Null, None).await
    }

    /// `initialize(config)`. May only be called once per Ready connection.
    pub async fn initialize(&self, config: Value) -> Result<Value, ClientError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(ClientError::AlreadyInitialized);
        }
        let result = self.call("initialize", config, None).await;
        if result.is_err() {
            self.initialized.store(false, Ordering::SeqCst);
        }
        result
    }

    /// `introspect(type ∈ {steps, capabilities})`.
    pub async fn introspect(&self, kind: &str) -> Result<Value, ClientError> {
        self.call("introspect", serde_json::json!({ "type": kind }), None)
            .await
    }

    /// `execute(action, args[])` — the hot path. Accepts a per-call timeout
    /// override.
    pub async fn execute(
        &self,
        action: &str,
        args: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, ClientError> {
        self.call(
            "execute",
            serde_json::json!({ "action": action, "args": args }),
            timeout,
        )
        .await
    }

    /// `health() → {status ∈ {ok, degraded}}`.
    pub async fn health(&self) -> Result<Value, ClientError> {
        self.call("health", Value::Null, Some(Duration::from_secs(5)))
            .await
    }

    /// Supplemental feature: a background task that polls `health()` on
    /// `interval` and publishes the outcome to a `watch` channel, so a
    /// supervising caller can observe `Unhealthy` before the next `execute`
    /// call trips on it (grounded in the teacher's `LIVENESS_INTERVAL`
    /// liveness-polling idiom). The task exits when the returned receiver and
    /// every clone of it are dropped.
    pub fn health_loop(self: &Arc<Self>, interval: Duration) -> watch::Receiver<HealthStatus> {
        let (tx, rx) = watch::channel(HealthStatus::Ok);
        let client = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                let status = match client.health().await {
                    Ok(result) => parse_health_status(&result),
                    Err(_) => HealthStatus::Unreachable,
                };
                if tx.send(status).is_err() {
                    break;
                }
            }
        });
        rx
    }

    /// `shutdown() → {shutdown: true}` — best-effort; closes the transport
    /// afterward regardless of the driver's response.
    pub async fn shutdown(&self) {
        let _ = self
            .call("shutdown", Value::Null, Some(Duration::from_secs(5)))
            .await;
        let mut guard = self.connection.lock().await;
        if let Some(connection) = guard.take() {
            let _ = connection.transport.close().await;
        }
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Attempt reconnect with the configured backoff. On success, replaces
    /// the live connection and drops all previously in-flight requests (they
    /// already completed with `DriverCommunication` when the old connection
    /// died). On exhaustion the caller (Registry) is expected to tear the
    /// driver down and restart it through the Process Supervisor.
    pub async fn reconnect(&self) -> Result<(), ClientError> {
        let mut last_err = None;
        for delay in &self.config.reconnect_backoff {
            tokio::time::sleep(*delay).await;
            match open_connection(
                &self.url,
                self.config.default_request_timeout,
                self.connected.clone(),
            )
            .await
            {
                Ok(connection) => {
                    *self.connection.lock().await = Some(connection);
                    self.connected.store(true, Ordering::SeqCst);
                    return Ok(());
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or(ClientError::DriverCommunication(
            "reconnect exhausted".into(),
        )))
    }

    async fn call(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, ClientError> {
        // A prior disconnect (§4.2 "Reconnect policy"): try to heal the
        // connection before failing the call outright. `reconnect()`
        // propagates its own exhaustion error if every backoff attempt fails.
        if !self.is_connected() {
            self.reconnect().await?;
        }

        let timeout = timeout.unwrap_or(self.config.default_request_timeout);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let request = RpcMessage::request(id.clone(), method, params);

        let (tx, rx) = oneshot::channel();
        {
            let guard = self.connection.lock().await;
            let connection = guard
                .as_ref()
                .ok_or_else(|| ClientError::DriverCommunication("not connected".into()))?;
            connection.pending.lock().insert(id.clone(), tx);
            connection.transport.send(&request).await?;
        }

        let response = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ClientError::DriverCommunication(
                "response channel dropped".into(),
            )),
            Err(_) => {
                if let Some(connection) = self.connection.lock().await.as_ref() {
                    connection.pending.lock().remove(&id);
                }
                Err(ClientError::Timeout)
            }
        }?;

        match response.error {
            Some(error) => Err(ClientError::DriverError(error)),
            None => Ok(response.result.unwrap_or(Value::Null)),
        }
    }
}

fn parse_health_status(result: &Value) -> HealthStatus {
    match result.get("status").and_then(Value::as_str) {
        Some("ok") => HealthStatus::Ok,
        Some("degraded") => HealthStatus::Degraded,
        _ => HealthStatus::Unreachable,
    }
}

async fn open_connection(
    url: &str,
    deadline: Duration,
    connected: Arc<AtomicBool>,
) -> Result<Connection, ClientError> {
    let (transport, events) = WsTransport::open(url, deadline).await?;
    let pending: PendingMap = Arc::new(SyncMutex::new(HashMap::new()));
    spawn_event_loop(pending.clone(), connected, events);
    Ok(Connection { transport, pending })
}

fn spawn_event_loop(
    pending: PendingMap,
    connected: Arc<AtomicBool>,
    mut events: mpsc::Receiver<TransportEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Message(message) => {
                    let sender = pending.lock().remove(&message.id);
                    match sender {
                        Some(tx) => {
                            let _ = tx.send(Ok(message));
                        }
                        None => {
                            tracing::warn!(id = %message.id, "dropping response with unknown id");
                        }
                    }
                }
                TransportEvent::Disconnected => {
                    connected.store(false, Ordering::SeqCst);
                    let mut pending = pending.lock();
                    for (_, tx) in pending.drain() {
                        let _ = tx.send(Err(ClientError::DriverCommunication(
                            "driver disconnected".into(),
                        )));
                    }
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
