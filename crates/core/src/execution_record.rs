// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-step and per-scenario outcomes recorded by the Feature Executor (§4.6).

use crate::driver::DriverId;
use crate::result::ExecutionResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Passed,
    Failed,
    /// The router returned `NoMatch`.
    Unresolved,
    /// Skipped because an earlier step failed and `stop_on_failure` is set.
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_text: String,
    pub driver_id: Option<DriverId>,
    pub action: Option<String>,
    pub outcome: StepOutcome,
    pub result: Option<ExecutionResult>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioOutcome {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub outcome: ScenarioOutcome,
    pub steps: Vec<StepResult>,
}

impl ScenarioResult {
    pub fn outcome_from_steps(steps: &[StepResult]) -> ScenarioOutcome {
        if steps
            .iter()
            .all(|s| matches!(s.outcome, StepOutcome::Passed))
        {
            ScenarioOutcome::Passed
        } else {
            ScenarioOutcome::Failed
        }
    }
}

#[cfg(test)]
#[path = "execution_record_tests.rs"]
mod tests;
