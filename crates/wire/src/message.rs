// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The JSON-RPC-over-WebSocket envelope drivers and the engine exchange
//! (§6.1).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Request,
    Response,
}

/// `{"code":<int>,"message":"<str>","details":{...}}` (§6.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }
}

/// Well-known error codes the protocol reserves (§6.1). The engine only uses
/// these for classification; any non-zero `error` on a response is treated
/// as a failed call regardless of code.
pub mod error_code {
    pub const BAD_REQUEST: i64 = 400;
    pub const NOT_FOUND: i64 = 404;
    pub const CONFLICT: i64 = 409;
    pub const INTERNAL: i64 = 500;
    pub const NOT_IMPLEMENTED: i64 = 501;
    pub const UNAVAILABLE: i64 = 503;
}

/// One JSON-RPC message frame (§6.1). Request and response share a struct
/// because both travel the same wire shape with different fields populated;
/// `validate()` enforces the invariant serde's untagged representation can't
/// express cheaply: exactly one of `result`/`error` present on responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("response {id} carries both result and error")]
    BothResultAndError { id: String },
    #[error("response {id} carries neither result nor error")]
    NeitherResultNorError { id: String },
    #[error("malformed JSON: {0}")]
    Malformed(String),
}

impl RpcMessage {
    pub fn request(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        Self {
            id: id.into(),
            kind: MessageKind::Request,
            method: Some(method.into()),
            params: Some(params),
            result: None,
            error: None,
        }
    }

    pub fn response_ok(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            kind: MessageKind::Response,
            method: None,
            params: None,
            result: Some(result),
            error: None,
        }
    }

    pub fn response_err(id: impl Into<String>, error: RpcError) -> Self {
        Self {
            id: id.into(),
            kind: MessageKind::Response,
            method: None,
            params: None,
            result: None,
            error: Some(error),
        }
    }

    /// Enforce the response invariant of §3: "exactly one of `result` or
    /// `error` is present on responses."
    pub fn validate(&self) -> Result<(), MessageError> {
        if self.kind == MessageKind::Response {
            match (&self.result, &self.error) {
                (Some(_), Some(_)) => {
                    return Err(MessageError::BothResultAndError {
                        id: self.id.clone(),
                    })
                }
                (None, None) => {
                    return Err(MessageError::NeitherResultNorError {
                        id: self.id.clone(),
                    })
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn is_error_response(&self) -> bool {
        self.kind == MessageKind::Response && self.error.is_some()
    }

    pub fn to_json(&self) -> Result<String, MessageError> {
        serde_json::to_string(self).map_err(|e| MessageError::Malformed(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, MessageError> {
        let message: Self =
            serde_json::from_str(text).map_err(|e| MessageError::Malformed(e.to_string()))?;
        message.validate()?;
        Ok(message)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
