// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line entry point. Thin over `runix-daemon::Engine`: every
//! subcommand bootstraps one `Engine` from `EngineConfig::load`, does its
//! one thing, and maps the outcome to the exit codes of §6.6.

mod cli;
mod exit_code;

use clap::Parser;
use cli::{Cli, Command};
use runix_daemon::EngineConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match EngineConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(exit_code::INIT_FAILURE);
        }
    };

    let _log_guard = match runix_daemon::setup_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: failed to initialize logging: {e}");
            std::process::exit(exit_code::INIT_FAILURE);
        }
    };

    let code = match cli.command {
        Command::Registry(cmd) => cli::registry::run(cmd, config).await,
        Command::Feature(cmd) => cli::feature::run(cmd, config).await,
        Command::Agent(cmd) => cli::agent::run(cmd, config).await,
    };
    drop(_log_guard);

    std::process::exit(code);
}
