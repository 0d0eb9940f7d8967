// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Feature Executor (C6): walks a parsed [`Feature`]'s scenarios step by
//! step, resolving each through the Step Router and dispatching to the
//! resolved driver via the Registry (§4.6).

use runix_core::{
    Feature, Scenario, ScenarioOutcome, ScenarioResult, StepOutcome, StepResult,
};
use runix_registry::Registry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tunables for a run; everything else comes from the feature text itself.
#[derive(Debug, Clone)]
pub struct FeatureExecutorConfig {
    /// Per-step timeout passed to the driver client's `execute` call.
    pub step_timeout: Duration,
}

impl Default for FeatureExecutorConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(30),
        }
    }
}

/// Runs scenarios one at a time, in source order, against drivers reached
/// through a shared [`Registry`] (§4.6). A caller that wants scenarios to
/// run concurrently fans out over `run_scenario` itself — this type stays
/// single-threaded per scenario so step ordering within one scenario is
/// never in question.
pub struct FeatureExecutor {
    registry: Arc<Registry>,
    config: FeatureExecutorConfig,
}

impl FeatureExecutor {
    pub fn new(registry: Arc<Registry>, config: FeatureExecutorConfig) -> Self {
        Self { registry, config }
    }

    /// Run every scenario in `feature` and return one [`ScenarioResult`] per
    /// scenario, in source order.
    pub async fn run(&self, feature: &Feature) -> Vec<ScenarioResult> {
        let mut results = Vec::with_capacity(feature.scenarios.len());
        for scenario in &feature.scenarios {
            results.push(self.run_scenario(scenario).await);
        }
        results
    }

    /// Run one scenario's steps in order. A failed or unresolved step halts
    /// the remaining steps only when `scenario.stop_on_failure` is set;
    /// otherwise every step still runs and the scenario outcome reflects
    /// whether any step failed (§4.6 "Failure handling").
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let mut steps = Vec::with_capacity(scenario.steps.len());
        let mut halted = false;

        for step_text in &scenario.steps {
            if halted {
                steps.push(StepResult {
                    step_text: step_text.text.clone(),
                    driver_id: None,
                    action: None,
                    outcome: StepOutcome::Skipped,
                    result: None,
                    duration_ms: 0,
                });
                continue;
            }

            let result = self.run_step(&step_text.text).await;
            if scenario.stop_on_failure
                && matches!(result.outcome, StepOutcome::Failed | StepOutcome::Unresolved)
            {
                halted = true;
            }
            steps.push(result);
        }

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            outcome: ScenarioResult::outcome_from_steps(&steps),
            steps,
        }
    }

    async fn run_step(&self, step_text: &str) -> StepResult {
        let start = Instant::now();

        let resolved = match self.registry.router().resolve(step_text) {
            Ok(resolved) => resolved,
            Err(no_match) => {
                tracing::warn!(step = %step_text, candidates = ?no_match.candidates, "step did not resolve to any driver");
                return StepResult {
                    step_text: step_text.to_string(),
                    driver_id: None,
                    action: None,
                    outcome: StepOutcome::Unresolved,
                    result: None,
                    duration_ms: start.elapsed().as_millis() as u64,
                };
            }
        };

        let client = match self.registry.instance(resolved.driver_id).await {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(driver = %resolved.driver_id, error = %e, "failed to reach driver for step");
                return StepResult {
                    step_text: step_text.to_string(),
                    driver_id: Some(resolved.driver_id),
                    action: Some(resolved.action),
                    outcome: StepOutcome::Failed,
                    result: Some(runix_core::ExecutionResult::err(
                        runix_core::ErrorInfo::new(-1, e.to_string()),
                    )),
                    duration_ms: start.elapsed().as_millis() as u64,
                };
            }
        };

        let args = serde_json::Value::Array(resolved.args);
        let outcome_result = client
            .execute(&resolved.action, args, Some(self.config.step_timeout))
            .await;

        let (outcome, result) = match outcome_result {
            Ok(value) => match serde_json::from_value::<runix_core::ExecutionResult>(value) {
                Ok(execution) => {
                    let outcome = if execution.success {
                        StepOutcome::Passed
                    } else {
                        StepOutcome::Failed
                    };
                    (outcome, Some(execution))
                }
                Err(e) => (
                    StepOutcome::Failed,
                    Some(runix_core::ExecutionResult::err(runix_core::ErrorInfo::new(
                        -2,
                        format!("driver returned a malformed execution result: {e}"),
                    ))),
                ),
            },
            Err(e) => (
                StepOutcome::Failed,
                Some(runix_core::ExecutionResult::err(runix_core::ErrorInfo::new(
                    -3, e.to_string(),
                ))),
            ),
        };

        StepResult {
            step_text: step_text.to_string(),
            driver_id: Some(resolved.driver_id),
            action: Some(resolved.action),
            outcome,
            result,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
#[path = "feature_executor_tests.rs"]
mod tests;
