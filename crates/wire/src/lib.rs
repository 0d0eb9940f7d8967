// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RPC Transport (C1): the JSON-RPC-over-WebSocket wire format engine and
//! drivers speak, and the duplex connection that carries it.
//!
//! Wire format: one JSON message per WebSocket text frame (§6.1). No length
//! prefix — WebSocket already frames messages for us.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod message;
mod transport;

pub use message::{error_code, MessageError, MessageKind, RpcError, RpcMessage};
pub use transport::{TransportError, TransportEvent, WsTransport};
