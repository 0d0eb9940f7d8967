// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use futures_util::{SinkExt, StreamExt};
use runix_core::DriverId;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Spawn a fake driver that answers every request with `handler(method,
/// params) -> Value` wrapped in a response, or drops the connection if
/// `handler` returns `None`.
async fn spawn_fake_driver<F>(handler: F) -> String
where
    F: Fn(&str, &Value) -> Option<Value> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                let (mut write, mut read) = ws.split();
                while let Some(Ok(WsMessage::Text(text))) = read.next().await {
                    let request = RpcMessage::from_json(&text).expect("valid request");
                    let method = request.method.clone().unwrap_or_default();
                    let params = request.params.clone().unwrap_or(Value::Null);
                    match handler(&method, &params) {
                        Some(result) => {
                            let response = RpcMessage::response_ok(request.id.clone(), result);
                            let _ = write
                                .send(WsMessage::Text(response.to_json().expect("serialize")))
                                .await;
                        }
                        None => break,
                    }
                }
            }
        }
    });
    format!("ws://127.0.0.1:{port}/")
}

#[tokio::test]
async fn capabilities_round_trips_through_a_live_connection() {
    let url = spawn_fake_driver(|method, _params| {
        assert_eq!(method, "capabilities");
        Some(serde_json::json!({ "name": "fake", "actions": [] }))
    })
    .await;

    let client = DriverClient::connect(DriverId::new(), url, ClientConfig::default())
        .await
        .expect("connect");
    let result = client.capabilities().await.expect("capabilities");
    assert_eq!(result["name"], "fake");
}

#[tokio::test]
async fn initialize_twice_is_rejected() {
    let url = spawn_fake_driver(|_m, _p| Some(serde_json::json!({ "initialized": true }))).await;
    let client = DriverClient::connect(DriverId::new(), url, ClientConfig::default())
        .await
        .expect("connect");

    client
        .initialize(serde_json::json!({}))
        .await
        .expect("first initialize succeeds");
    let second = client.initialize(serde_json::json!({})).await;
    assert!(matches!(second, Err(ClientError::AlreadyInitialized)));
}

#[tokio::test]
async fn execute_surfaces_driver_error() {
    let url = spawn_fake_driver(|_m, _p| None).await;
    // Connect succeeds, but the driver closes before answering `execute`.
    let client = DriverClient::connect(DriverId::new(), url, ClientConfig::default())
        .await
        .expect("connect");

    let result = client
        .execute("click", serde_json::json!({}), Some(Duration::from_millis(500)))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn call_times_out_when_driver_never_responds() {
    // A listener that accepts but never replies.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            let ws = tokio_tungstenite::accept_async(stream).await.expect("handshake");
            // Hold the connection open without reading or writing.
            let (_write, mut read) = ws.split();
            while read.next().await.is_some() {}
        }
    });

    let url = format!("ws://127.0.0.1:{port}/");
    let client = DriverClient::connect(DriverId::new(), url, ClientConfig::default())
        .await
        .expect("connect");

    let result = client
        .execute("click", serde_json::json!({}), Some(Duration::from_millis(100)))
        .await;
    assert!(matches!(result, Err(ClientError::Timeout)));
}

#[tokio::test]
async fn disconnect_flips_connected_flag() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                drop(ws);
            }
        }
    });

    let url = format!("ws://127.0.0.1:{port}/");
    let client = DriverClient::connect(DriverId::new(), url, ClientConfig::default())
        .await
        .expect("connect");

    // Give the background reader a moment to observe the close.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let _ = client.health().await;
    assert!(!client.is_connected());
}

#[tokio::test]
async fn execute_reconnects_after_external_disconnect_then_succeeds() {
    // §8 scenario 3: externally kill the socket while Ready, then the next
    // `execute` call triggers reconnect attempts and completes once the
    // socket is restored.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    tokio::spawn(async move {
        // First connection: handshake, then drop without ever answering —
        // simulates an externally killed socket.
        if let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                drop(ws);
            }
        }
        // Second connection (the reconnect attempt): answer normally.
        if let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                let (mut write, mut read) = ws.split();
                while let Some(Ok(WsMessage::Text(text))) = read.next().await {
                    let request = RpcMessage::from_json(&text).expect("valid request");
                    let result = serde_json::json!({ "success": true });
                    let response = RpcMessage::response_ok(request.id.clone(), result);
                    let _ = write
                        .send(WsMessage::Text(response.to_json().expect("serialize")))
                        .await;
                }
            }
        }
    });

    let url = format!("ws://127.0.0.1:{port}/");
    let client = DriverClient::connect(DriverId::new(), url, ClientConfig::default())
        .await
        .expect("connect");

    // Give the background reader a moment to observe the close.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!client.is_connected());

    let result = client
        .execute("click", serde_json::json!({}), Some(Duration::from_secs(5)))
        .await
        .expect("execute reconnects and succeeds");
    assert_eq!(result["success"], true);
    assert!(client.is_connected());
}

#[tokio::test]
async fn health_loop_publishes_degraded_status() {
    let url = spawn_fake_driver(|method, _params| {
        assert_eq!(method, "health");
        Some(serde_json::json!({ "status": "degraded" }))
    })
    .await;

    let client = Arc::new(
        DriverClient::connect(DriverId::new(), url, ClientConfig::default())
            .await
            .expect("connect"),
    );
    let mut rx = client.health_loop(Duration::from_millis(20));
    rx.changed().await.expect("first tick");
    assert_eq!(*rx.borrow(), HealthStatus::Degraded);
}

#[tokio::test]
async fn health_loop_reports_unreachable_after_disconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                drop(ws);
            }
        }
    });

    let url = format!("ws://127.0.0.1:{port}/");
    let client = Arc::new(
        DriverClient::connect(DriverId::new(), url, ClientConfig::default())
            .await
            .expect("connect"),
    );
    let mut rx = client.health_loop(Duration::from_millis(20));
    rx.changed().await.expect("first tick");
    assert_eq!(*rx.borrow(), HealthStatus::Unreachable);
}
