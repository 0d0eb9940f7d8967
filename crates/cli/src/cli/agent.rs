// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::cli::error::CliError;
use crate::cli::AgentCommand;
use crate::exit_code;
use runix_core::SessionState;
use runix_daemon::{Engine, EngineConfig};
use runix_engine::{AgentLoop, AgentLoopControl, DriverRoles};

pub async fn run(cmd: AgentCommand, config: EngineConfig) -> i32 {
    match cmd {
        AgentCommand::Run {
            goal,
            system,
            vision,
            llm,
        } => run_goal(config, goal, system, vision, llm).await,
    }
}

async fn run_goal(
    config: EngineConfig,
    goal: String,
    system: runix_core::DriverId,
    vision: runix_core::DriverId,
    llm: runix_core::DriverId,
) -> i32 {
    let agent_loop_config = config.agent_loop_config();
    let engine = Engine::bootstrap(config);

    for id in [system, vision, llm] {
        if engine.registry.get(&id).is_none() {
            eprintln!("error: {}", CliError::UnknownDriver(id));
            return exit_code::INIT_FAILURE;
        }
    }

    tracing::info!(%system, %vision, %llm, goal = %goal, "starting agent loop");

    let agent_loop = AgentLoop::new(
        engine.registry.clone(),
        engine.artifact_store.clone(),
        runix_core::SystemClock,
        DriverRoles { system, vision, llm },
        agent_loop_config,
    );

    let control = AgentLoopControl::new();
    let signal_control = control.clone();
    let signal_task = tokio::spawn(async move {
        let sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate());
        match sigterm {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => signal_control.abort(),
                    _ = sigterm.recv() => signal_control.abort(),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler, watching Ctrl-C only");
                if tokio::signal::ctrl_c().await.is_ok() {
                    signal_control.abort();
                }
            }
        }
    });

    let session = agent_loop.run(goal, control).await;
    signal_task.abort();

    println!("session {} ended {}", session.id, session.state);
    if let Some(reason) = &session.failure_reason {
        println!("failure reason: {reason}");
    }

    engine.cleanup.run().await;

    match session.state {
        SessionState::Completed => exit_code::SUCCESS,
        SessionState::Stopped => exit_code::ABORTED_BY_SIGNAL,
        SessionState::Failed => exit_code::SCENARIO_FAILURE,
        SessionState::Running | SessionState::Paused => {
            unreachable!("Agent Loop::run only returns in a terminal or stopped state")
        }
    }
}

