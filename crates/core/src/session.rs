// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Loop session state (§3, §4.7).

use crate::action::LlmDecision;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// One run of the Agent Loop toward a goal.
    pub struct SessionId("ses-");
}

/// Session state machine (§4.7).
///
/// ```text
///            Completed
/// Running <-> Paused
///    |            \
///    v             v
/// Stopped        Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Running,
    Paused,
    Stopped,
    Completed,
    Failed,
}

crate::simple_display! {
    SessionState {
        Running => "running",
        Paused => "paused",
        Stopped => "stopped",
        Completed => "completed",
        Failed => "failed",
    }
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Stopped | SessionState::Completed | SessionState::Failed
        )
    }
}

/// One perceive -> plan -> act cycle inside a Session (§3, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    /// Relative path to the screenshot used for this iteration (stored by
    /// reference, not inline — §4.7 "History retention").
    pub screenshot_ref: Option<String>,
    pub analysis: Option<serde_json::Value>,
    pub decision: Option<LlmDecision>,
    pub action_result: Option<serde_json::Value>,
    pub timestamp_ms: u64,
    /// Non-fatal notices recorded during this iteration (e.g. a coordinate
    /// clamp warning); does not affect the iteration's success.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Reason a session ended in `Failed` (§4.7 "Termination conditions").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    CaptureFailed,
    AnalysisFailed,
    InvalidLlmOutput,
    IterationBudgetExceeded,
    DriverUnavailable(String),
}

crate::simple_display! {
    FailureReason {
        CaptureFailed => "capture_failed",
        AnalysisFailed => "analysis_failed",
        InvalidLlmOutput => "invalid_llm_output",
        IterationBudgetExceeded => "iteration_budget_exceeded",
        DriverUnavailable(..) => "driver_unavailable",
    }
}

/// One run of the Agent Loop (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub goal: String,
    pub iteration: u32,
    pub max_iterations: u32,
    pub state: SessionState,
    pub history: Vec<IterationRecord>,
    pub artifacts: Vec<String>,
    pub failure_reason: Option<FailureReason>,
}

impl Session {
    pub fn new(goal: impl Into<String>, max_iterations: u32) -> Self {
        Self {
            id: SessionId::new(),
            goal: goal.into(),
            iteration: 0,
            max_iterations,
            state: SessionState::Running,
            history: Vec::new(),
            artifacts: Vec::new(),
            failure_reason: None,
        }
    }

    /// The last `k` history entries, the window passed to the LLM driver
    /// (§4.7 "History retention", default k=2). Full history stays on the
    /// session for audit.
    pub fn recent_history(&self, k: usize) -> &[IterationRecord] {
        let len = self.history.len();
        &self.history[len.saturating_sub(k)..]
    }

    pub fn complete(&mut self) {
        self.state = SessionState::Completed;
    }

    pub fn fail(&mut self, reason: FailureReason) {
        self.state = SessionState::Failed;
        self.failure_reason = Some(reason);
    }

    pub fn stop(&mut self) {
        self.state = SessionState::Stopped;
    }

    pub fn pause(&mut self) {
        if self.state == SessionState::Running {
            self.state = SessionState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == SessionState::Paused {
            self.state = SessionState::Running;
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
