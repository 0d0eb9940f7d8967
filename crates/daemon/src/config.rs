// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate (mirrors
//! the teacher's `env.rs`: one function per tunable, collected into a
//! single immutable config loaded once at startup).

use runix_adapters::client::ClientConfig;
use runix_adapters::supervisor::SupervisorConfig;
use runix_engine::{AgentLoopConfig, FeatureExecutorConfig};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve a home directory; set RUNIX_OUTPUT_ROOT explicitly")]
    NoHomeDir,
}

/// Every tunable named in the spec, collected in one place and loaded once
/// at startup. No business-logic code reads `std::env` directly outside of
/// this module and the Process Supervisor's child-environment injection
/// (which is wire format, not tuning).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directories scanned one level deep for driver manifests
    /// (`RUNIX_DRIVER_DIR`, colon-separated).
    pub search_paths: Vec<PathBuf>,
    /// Root of the Artifact Store's `sessions/` tree (`RUNIX_OUTPUT_ROOT`).
    pub output_root: PathBuf,
    pub default_request_timeout: Duration,
    pub reconnect_backoff: Vec<Duration>,
    pub startup_timeout: Duration,
    pub stop_grace: Duration,
    pub stdio_tail_lines: usize,
    pub max_iterations: u32,
    pub iteration_delay: Duration,
    pub pause_duration: Duration,
    pub display_width: i64,
    pub display_height: i64,
    pub step_timeout: Duration,
    /// Global budget for the Cleanup Manager's LIFO handler sweep.
    pub cleanup_budget: Duration,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub log_console: bool,
}

impl EngineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            search_paths: driver_path()?,
            output_root: output_root()?,
            default_request_timeout: duration_ms_env("RUNIX_REQUEST_TIMEOUT_MS", 30_000),
            reconnect_backoff: reconnect_backoff(),
            startup_timeout: duration_ms_env("RUNIX_STARTUP_TIMEOUT_MS", 10_000),
            stop_grace: duration_ms_env("RUNIX_STOP_GRACE_MS", 5_000),
            stdio_tail_lines: usize_env("RUNIX_STDIO_TAIL_LINES", 200),
            max_iterations: u32_env("RUNIX_MAX_ITERATIONS", 50),
            iteration_delay: duration_ms_env("RUNIX_ITERATION_DELAY_MS", 500),
            pause_duration: duration_ms_env("RUNIX_PAUSE_DURATION_MS", 30_000),
            display_width: i64_env("RUNIX_DISPLAY_WIDTH", 1920),
            display_height: i64_env("RUNIX_DISPLAY_HEIGHT", 1080),
            step_timeout: duration_ms_env("RUNIX_STEP_TIMEOUT_MS", 30_000),
            cleanup_budget: duration_ms_env("RUNIX_CLEANUP_BUDGET_MS", 10_000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_file: std::env::var("LOG_FILE").ok().map(PathBuf::from),
            log_console: std::env::var("LOG_CONSOLE")
                .map(|v| v != "0")
                .unwrap_or(true),
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            default_request_timeout: self.default_request_timeout,
            reconnect_backoff: self.reconnect_backoff.clone(),
        }
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            startup_timeout: self.startup_timeout,
            stop_grace: self.stop_grace,
            stdio_tail_lines: self.stdio_tail_lines,
        }
    }

    pub fn feature_executor_config(&self) -> FeatureExecutorConfig {
        FeatureExecutorConfig {
            step_timeout: self.step_timeout,
        }
    }

    pub fn agent_loop_config(&self) -> AgentLoopConfig {
        AgentLoopConfig {
            max_iterations: self.max_iterations,
            iteration_delay: self.iteration_delay,
            pause_duration: self.pause_duration,
            display_width: self.display_width,
            display_height: self.display_height,
            fail_fast_on_capture: true,
            history_window: 2,
        }
    }
}

fn driver_path() -> Result<Vec<PathBuf>, ConfigError> {
    Ok(std::env::var("RUNIX_DRIVER_DIR")
        .ok()
        .map(|raw| raw.split(':').map(PathBuf::from).collect())
        .unwrap_or_default())
}

/// Resolve the output root: `RUNIX_OUTPUT_ROOT` > `XDG_STATE_HOME/runix` >
/// `~/.local/state/runix`.
fn output_root() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("RUNIX_OUTPUT_ROOT") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("runix"));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".local/state/runix"))
}

fn reconnect_backoff() -> Vec<Duration> {
    std::env::var("RUNIX_RECONNECT_BACKOFF_MS")
        .ok()
        .map(|raw| {
            raw.split(',')
                .filter_map(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .collect::<Vec<_>>()
        })
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| {
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
            ]
        })
}

fn duration_ms_env(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(u64_env(name, default_ms))
}

fn u64_env(name: &str, default: u64) -> u64 {
    std::env::var(name).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn u32_env(name: &str, default: u32) -> u32 {
    std::env::var(name).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn i64_env(name: &str, default: i64) -> i64 {
    std::env::var(name).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn usize_env(name: &str, default: usize) -> usize {
    std::env::var(name).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
