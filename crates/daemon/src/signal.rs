// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS signal handling: SIGINT/SIGTERM run the Cleanup Manager once, then
//! exit with the conventional `128 + signal number` code.

use crate::cleanup::CleanupManager;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;

/// Spawn the background task that waits for SIGINT or SIGTERM, runs
/// `cleanup` exactly once, and exits the process. Returns the task handle
/// so a caller (e.g. the CLI's own shutdown path) can also abort it after a
/// graceful in-band shutdown, avoiding a double cleanup run.
pub fn install_signal_handlers(cleanup: Arc<CleanupManager>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGINT handler");
                return;
            }
        };

        let exit_code = tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, running cleanup");
                143
            }
            _ = sigint.recv() => {
                tracing::info!("received SIGINT, running cleanup");
                130
            }
        };

        cleanup.run().await;
        std::process::exit(exit_code);
    })
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
