// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed result shape for a driver's `execute` call and for step/scenario
//! outcomes (§3, §9 "Duck-typed driver results").

use serde::{Deserialize, Serialize};

/// Structured error detail carried by a failed call (§7: "a structured error
/// object with `code`, `message`, `details`, and the driver id where
/// applicable").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }
}

/// Normalized `execute` outcome. Never a raw duck-typed JSON blob at the
/// call site — `data` is still `serde_json::Value` because action-specific
/// shape belongs to the driver, but callers go through narrowly typed
/// helpers (e.g. screenshot path extraction in `runix-engine`) rather than
/// inspecting it ad hoc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
    #[serde(default)]
    pub artifact: Option<String>,
}

impl ExecutionResult {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            artifact: None,
        }
    }

    pub fn err(error: ErrorInfo) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            artifact: None,
        }
    }

    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
