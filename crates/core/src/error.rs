// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy (kinds, not names).
//!
//! Lower-level crates define their own `thiserror` enums for their specific
//! failure modes (`TransportError`, `SupervisorError`, ...) and convert into
//! this type at crate boundaries, so callers higher up the stack can match
//! on kind without depending on every crate's internal error type.

use thiserror::Error;

/// The error kinds the orchestration engine distinguishes end to end.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad manifest, missing executable, invalid search path. Surfaced at
    /// startup; not retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Spawn failed, port never accepted, handshake failed.
    #[error("driver startup error: {0}")]
    DriverStartup(String),

    /// Transport closed unexpectedly, response timeout, malformed response.
    #[error("driver communication error: {0}")]
    DriverCommunication(String),

    /// `NoMatch` from the router.
    #[error("no step matches {step_text:?}")]
    StepResolution {
        step_text: String,
        candidates: Vec<String>,
    },

    /// Driver returned an `error` field; propagated verbatim.
    #[error("step execution error: [{code}] {message}")]
    StepExecution { code: i64, message: String },

    /// Invalid LLM output after one repair attempt, or iteration budget
    /// exhausted.
    #[error("agent loop error: {0}")]
    AgentLoop(String),

    /// Uncaught condition in the engine process.
    #[error("fatal engine error: {0}")]
    Fatal(String),
}

impl EngineError {
    /// Process exit code this error kind maps to (§6.6).
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::Configuration(_) | EngineError::DriverStartup(_) => 1,
            EngineError::StepResolution { .. } => 2,
            EngineError::StepExecution { .. }
            | EngineError::DriverCommunication(_)
            | EngineError::AgentLoop(_) => 3,
            EngineError::Fatal(_) => 1,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
