// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod agent;
pub mod error;
pub mod feature;
pub mod registry;

use clap::{Parser, Subcommand};
use runix_core::DriverId;
use std::path::PathBuf;

/// `<crate version>+<short git hash>`, baked in by `build.rs`.
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

#[derive(Debug, Parser)]
#[command(name = "runix", about = "Automation orchestration engine", version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Driver registry operations.
    #[command(subcommand)]
    Registry(RegistryCommand),
    /// Feature file operations.
    #[command(subcommand)]
    Feature(FeatureCommand),
    /// Agent Loop operations.
    #[command(subcommand)]
    Agent(AgentCommand),
}

#[derive(Debug, Subcommand)]
pub enum RegistryCommand {
    /// Discover driver manifests under the given search paths (in addition
    /// to the paths configured via `RUNIX_DRIVER_DIR`) and print what was
    /// found.
    Discover {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum FeatureCommand {
    /// Parse and run every scenario in a feature file.
    Run { file: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum AgentCommand {
    /// Run the perceive -> plan -> act loop toward a goal.
    Run {
        #[arg(long)]
        goal: String,
        #[arg(long, value_parser = parse_driver_id)]
        system: DriverId,
        #[arg(long, value_parser = parse_driver_id)]
        vision: DriverId,
        #[arg(long, value_parser = parse_driver_id)]
        llm: DriverId,
    },
}

fn parse_driver_id(raw: &str) -> Result<DriverId, std::convert::Infallible> {
    Ok(DriverId::from_string(raw))
}
