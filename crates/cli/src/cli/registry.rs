// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::cli::RegistryCommand;
use crate::exit_code;
use runix_daemon::{Engine, EngineConfig};

pub async fn run(cmd: RegistryCommand, mut config: EngineConfig) -> i32 {
    match cmd {
        RegistryCommand::Discover { paths } => discover(&mut config, paths).await,
    }
}

async fn discover(config: &mut EngineConfig, extra_paths: Vec<std::path::PathBuf>) -> i32 {
    config.search_paths.extend(extra_paths);
    let engine = Engine::bootstrap(config.clone());
    let signal_task = runix_daemon::install_signal_handlers(engine.cleanup.clone());

    for record in engine.registry.list() {
        println!("{}\t{:?}", record.id, record.state);
    }
    signal_task.abort();

    let errors = engine.registry.discovery_errors();
    engine.cleanup.run().await;

    if errors.is_empty() {
        exit_code::SUCCESS
    } else {
        for error in &errors {
            eprintln!("error: {}: {}", error.path.display(), error.message);
        }
        exit_code::INIT_FAILURE
    }
}
