// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Loop (C7): the perceive -> plan -> act cycle driving a System
//! driver, a Vision driver, and an LLM driver toward a goal (§4.7).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use runix_core::{
    ActionVariant, Clock, DriverId, FailureReason, IterationRecord, LlmDecision, Session,
    SessionState,
};
use runix_registry::Registry;
use runix_storage::ArtifactStore;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The three driver roles the loop dispatches to. Resolved once at
/// construction rather than re-resolved by name every iteration.
#[derive(Debug, Clone, Copy)]
pub struct DriverRoles {
    pub system: DriverId,
    pub vision: DriverId,
    pub llm: DriverId,
}

#[derive(Debug, Clone)]
pub struct AgentLoopConfig {
    pub max_iterations: u32,
    pub iteration_delay: Duration,
    pub pause_duration: Duration,
    pub display_width: i64,
    pub display_height: i64,
    /// Whether a failed screenshot capture fails the session immediately
    /// (§4.7 "Termination conditions") rather than reusing the previous
    /// screenshot reference for one more attempt.
    pub fail_fast_on_capture: bool,
    /// `K`: how many of the most recent iteration records are sent to the
    /// LLM driver (§4.7 "History retention", default 2).
    pub history_window: usize,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            iteration_delay: Duration::from_millis(500),
            pause_duration: Duration::from_secs(30),
            display_width: 1920,
            display_height: 1080,
            fail_fast_on_capture: true,
            history_window: 2,
        }
    }
}

/// A shared handle a caller uses to request abort or pause from outside the
/// running loop (§ supplemental: "session cancellation token distinct from
/// the abort signal source"). Cheap to clone; every clone controls the same
/// underlying flags.
#[derive(Clone, Default)]
pub struct AgentLoopControl {
    abort: Arc<AtomicBool>,
    pause_requested: Arc<AtomicBool>,
}

impl AgentLoopControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the loop stop at the next safe point; the session ends
    /// `Stopped`, not `Failed`.
    pub fn abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    /// Request the loop pause at the next iteration boundary for
    /// `pauseDuration`, then resume automatically.
    pub fn request_pause(&self) {
        self.pause_requested.store(true, Ordering::SeqCst);
    }

    fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    fn take_pause_request(&self) -> bool {
        self.pause_requested.swap(false, Ordering::SeqCst)
    }
}

/// Runs one [`Session`] to a terminal state against drivers reached through
/// a shared [`Registry`].
pub struct AgentLoop<C: Clock> {
    registry: Arc<Registry>,
    artifact_store: Arc<ArtifactStore<C>>,
    clock: C,
    roles: DriverRoles,
    config: AgentLoopConfig,
}

impl<C: Clock> AgentLoop<C> {
    pub fn new(
        registry: Arc<Registry>,
        artifact_store: Arc<ArtifactStore<C>>,
        clock: C,
        roles: DriverRoles,
        config: AgentLoopConfig,
    ) -> Self {
        Self {
            registry,
            artifact_store,
            clock,
            roles,
            config,
        }
    }

    /// Run the full perceive -> plan -> act cycle toward `goal` until the
    /// session reaches a terminal state (§4.7 "Termination conditions"), or
    /// `control` requests abort. Returns the finished (or stopped) session.
    pub async fn run(&self, goal: impl Into<String>, control: AgentLoopControl) -> Session {
        let mut session = Session::new(goal, self.config.max_iterations);
        let mut pause_until: Option<Instant> = None;
        let mut last_screenshot_ref: Option<String> = None;

        loop {
            if control.is_aborted() {
                session.stop();
                self.persist_history(&session).await;
                break;
            }

            if control.take_pause_request() {
                session.pause();
                pause_until = Some(Instant::now() + self.config.pause_duration);
            }

            if session.state == SessionState::Paused {
                if let Some(until) = pause_until {
                    if Instant::now() < until {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        continue;
                    }
                }
                session.resume();
                pause_until = None;
            }

            if session.iteration >= session.max_iterations {
                session.fail(FailureReason::IterationBudgetExceeded);
                self.persist_history(&session).await;
                break;
            }

            let mut warnings = Vec::new();

            let screenshot_ref = match self.capture_screenshot(session.id).await {
                Ok(reference) => {
                    last_screenshot_ref = Some(reference.clone());
                    Some(reference)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "screenshot capture failed");
                    if self.config.fail_fast_on_capture {
                        None
                    } else {
                        last_screenshot_ref.clone()
                    }
                }
            };
            let Some(screenshot_ref) = screenshot_ref else {
                session.fail(FailureReason::CaptureFailed);
                self.persist_history(&session).await;
                break;
            };

            let analysis = match self.analyze_scene(&screenshot_ref).await {
                Ok(analysis) => analysis,
                Err(e) => {
                    tracing::warn!(error = %e, "scene analysis failed");
                    session.fail(FailureReason::AnalysisFailed);
                    self.persist_history(&session).await;
                    break;
                }
            };

            let history_window = session.recent_history(self.config.history_window).to_vec();
            let decision = match self
                .decide(&session.goal, &analysis, &history_window, &screenshot_ref)
                .await
            {
                Ok(decision) => decision,
                Err(e) => {
                    tracing::warn!(error = %e, "LLM driver returned an invalid decision after the repair pass");
                    session.fail(FailureReason::InvalidLlmOutput);
                    self.persist_history(&session).await;
                    break;
                }
            };

            if decision.is_complete {
                session.history.push(IterationRecord {
                    iteration: session.iteration,
                    screenshot_ref: Some(screenshot_ref),
                    analysis: Some(analysis),
                    decision: Some(decision),
                    action_result: None,
                    timestamp_ms: self.clock.epoch_ms(),
                    warnings,
                });
                session.iteration += 1;
                session.complete();
                self.persist_history(&session).await;
                break;
            }

            let mut action = decision.action.clone();
            if action.clamp_to_display(self.config.display_width, self.config.display_height) {
                tracing::warn!(action = action.name(), "action coordinates clamped to display bounds");
                warnings.push("coordinates clamped to display bounds".to_string());
            }

            let action_result = match self.dispatch_action(&action).await {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(error = %e, action = action.name(), "action dispatch failed");
                    None
                }
            };

            session.history.push(IterationRecord {
                iteration: session.iteration,
                screenshot_ref: Some(screenshot_ref),
                analysis: Some(analysis),
                decision: Some(decision),
                action_result,
                timestamp_ms: self.clock.epoch_ms(),
                warnings,
            });
            session.iteration += 1;
            self.persist_history(&session).await;

            if control.is_aborted() {
                session.stop();
                self.persist_history(&session).await;
                break;
            }

            tokio::time::sleep(self.config.iteration_delay).await;
        }

        session
    }

    /// Calls the System driver's `takeScreenshot` action, which returns the
    /// captured frame as base64-encoded PNG bytes in `data.image` (the wire
    /// format only carries bytes; writing them to disk is the Artifact
    /// Store's job, not the driver's). Returns the written artifact's path,
    /// relative to the output root, as the reference passed to the Vision
    /// and LLM drivers.
    async fn capture_screenshot(&self, session_id: runix_core::SessionId) -> Result<String, AgentLoopError> {
        let client = self
            .registry
            .instance(self.roles.system)
            .await
            .map_err(|e| AgentLoopError::DriverCommunication(e.to_string()))?;
        let value = client
            .execute("takeScreenshot", Value::Array(Vec::new()), None)
            .await
            .map_err(|e| AgentLoopError::DriverCommunication(e.to_string()))?;
        let execution: runix_core::ExecutionResult = serde_json::from_value(value)
            .map_err(|e| AgentLoopError::MalformedResponse(e.to_string()))?;
        if !execution.success {
            return Err(AgentLoopError::DriverCommunication(
                execution
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "takeScreenshot failed".to_string()),
            ));
        }
        let encoded = execution
            .data
            .as_ref()
            .and_then(|d| d.get("image"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| AgentLoopError::MalformedResponse("no image bytes in takeScreenshot response".into()))?;
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| AgentLoopError::MalformedResponse(format!("invalid base64 image data: {e}")))?;
        let artifact = self
            .artifact_store
            .write_screenshot(session_id, &bytes)
            .map_err(|e| AgentLoopError::MalformedResponse(format!("failed to write screenshot: {e}")))?;
        Ok(artifact.path.to_string_lossy().into_owned())
    }

    /// Best-effort `history.json` persistence: a write failure is logged,
    /// not propagated, since losing the audit trail must never abort a
    /// session that otherwise completed or failed cleanly (§4.8).
    async fn persist_history(&self, session: &Session) {
        if let Err(e) = self.artifact_store.write_history(session) {
            tracing::warn!(error = %e, session = %session.id, "failed to persist session history");
        }
    }

    async fn analyze_scene(&self, screenshot_ref: &str) -> Result<Value, AgentLoopError> {
        let client = self
            .registry
            .instance(self.roles.vision)
            .await
            .map_err(|e| AgentLoopError::DriverCommunication(e.to_string()))?;
        let value = client
            .execute(
                "analyzeScene",
                serde_json::json!([{ "screenshot": screenshot_ref }]),
                None,
            )
            .await
            .map_err(|e| AgentLoopError::DriverCommunication(e.to_string()))?;
        let execution: runix_core::ExecutionResult = serde_json::from_value(value)
            .map_err(|e| AgentLoopError::MalformedResponse(e.to_string()))?;
        if !execution.success {
            return Err(AgentLoopError::DriverCommunication(
                execution
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "analyzeScene failed".to_string()),
            ));
        }
        Ok(execution.data.unwrap_or(Value::Null))
    }

    async fn decide(
        &self,
        goal: &str,
        environment: &Value,
        history: &[IterationRecord],
        screenshot_ref: &str,
    ) -> Result<LlmDecision, AgentLoopError> {
        let client = self
            .registry
            .instance(self.roles.llm)
            .await
            .map_err(|e| AgentLoopError::DriverCommunication(e.to_string()))?;
        let args = serde_json::json!([{
            "goal": goal,
            "environment": environment,
            "displaySize": { "width": self.config.display_width, "height": self.config.display_height },
            "iterationHistory": history,
            "screenshot": screenshot_ref,
        }]);
        let value = client
            .execute("analyzeScreenAndDecide", args, None)
            .await
            .map_err(|e| AgentLoopError::DriverCommunication(e.to_string()))?;
        parse_decision(&value)
    }

    async fn dispatch_action(&self, action: &ActionVariant) -> Result<Value, AgentLoopError> {
        let client = self
            .registry
            .instance(self.roles.system)
            .await
            .map_err(|e| AgentLoopError::DriverCommunication(e.to_string()))?;
        let args = serde_json::to_value(action)
            .map_err(|e| AgentLoopError::MalformedResponse(e.to_string()))?;
        client
            .execute(action.name(), Value::Array(vec![args]), None)
            .await
            .map_err(|e| AgentLoopError::DriverCommunication(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
enum AgentLoopError {
    #[error("driver communication error: {0}")]
    DriverCommunication(String),
    #[error("malformed driver response: {0}")]
    MalformedResponse(String),
}

/// Parse the LLM driver's `execute` return into an [`LlmDecision`]. The
/// closed `ActionVariant` union already rejects an unrecognized `type` at
/// `serde` level (§4.7 step 6); on failure, attempt one repair pass that
/// extracts the substring between the first `{` and the last `}` (handling
/// an LLM response wrapped in prose or markdown fences) and reparses it.
/// Still-invalid shape after the repair pass is an error.
fn parse_decision(value: &Value) -> Result<LlmDecision, AgentLoopError> {
    let payload = value
        .get("data")
        .cloned()
        .unwrap_or_else(|| value.clone());

    if let Ok(decision) = serde_json::from_value::<LlmDecision>(payload.clone()) {
        return Ok(decision);
    }

    let text = payload.as_str().or_else(|| value.as_str());
    if let Some(text) = text {
        if let Some(repaired) = extract_json_object(text) {
            if let Ok(repaired_value) = serde_json::from_str::<Value>(&repaired) {
                if let Ok(decision) = serde_json::from_value::<LlmDecision>(repaired_value) {
                    return Ok(decision);
                }
            }
        }
    }

    Err(AgentLoopError::MalformedResponse(
        "LLM decision did not match the expected shape, even after the repair pass".into(),
    ))
}

fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(text[start..=end].to_string())
}

#[cfg(test)]
#[path = "agent_loop_tests.rs"]
mod tests;
