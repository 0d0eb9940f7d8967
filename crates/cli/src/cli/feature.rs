// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::cli::error::CliError;
use crate::cli::FeatureCommand;
use crate::exit_code;
use runix_core::{Feature, ScenarioOutcome, StepOutcome};
use runix_daemon::{Engine, EngineConfig};
use std::path::PathBuf;

pub async fn run(cmd: FeatureCommand, config: EngineConfig) -> i32 {
    match cmd {
        FeatureCommand::Run { file } => match read_feature(&file) {
            Ok(feature) => run_file(config, feature).await,
            Err(e) => {
                eprintln!("error: {e}");
                exit_code::INIT_FAILURE
            }
        },
    }
}

fn read_feature(path: &PathBuf) -> Result<Feature, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.clone(),
        source,
    })?;
    Feature::parse(&text).map_err(|source| CliError::ParseFeature {
        path: path.clone(),
        source,
    })
}

async fn run_file(config: EngineConfig, feature: Feature) -> i32 {
    let engine = Engine::bootstrap(config);
    if !engine.registry.discovery_errors().is_empty() {
        for error in engine.registry.discovery_errors() {
            eprintln!("error: {}: {}", error.path.display(), error.message);
        }
        return exit_code::INIT_FAILURE;
    }

    let signal_task = runix_daemon::install_signal_handlers(engine.cleanup.clone());

    tracing::info!(feature = %feature.name, scenarios = feature.scenarios.len(), "running feature");
    let results = engine.feature_executor.run(&feature).await;
    signal_task.abort();

    let mut any_unresolved = false;
    let mut any_failed = false;
    for scenario in &results {
        let marker = match scenario.outcome {
            ScenarioOutcome::Passed => "PASS",
            ScenarioOutcome::Failed => "FAIL",
        };
        println!("{marker} {}", scenario.scenario_name);
        for step in &scenario.steps {
            println!("  [{:?}] {}", step.outcome, step.step_text);
            if step.outcome == StepOutcome::Unresolved {
                any_unresolved = true;
            }
        }
        if scenario.outcome == ScenarioOutcome::Failed {
            any_failed = true;
        }
    }

    engine.cleanup.run().await;

    if any_unresolved {
        exit_code::UNRESOLVED_STEP
    } else if any_failed {
        exit_code::SCENARIO_FAILURE
    } else {
        exit_code::SUCCESS
    }
}
