// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cleanup Manager (C9): runs every registered teardown handler in LIFO
//! order within a global time budget on any exit path (interrupt, terminate,
//! or an uncaught condition in the process), falling back to an emergency
//! kill of every tracked driver process if the budget is exceeded.

use parking_lot::Mutex;
use runix_adapters::supervisor::ProcessSupervisor;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

type CleanupFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type CleanupHandler = Box<dyn Fn() -> CleanupFuture + Send + Sync>;

/// LIFO registry of teardown handlers plus the emergency fallback over the
/// process table. One instance per process; registered handlers are
/// consumed (not replayed) by `run`.
pub struct CleanupManager {
    handlers: Mutex<Vec<(String, CleanupHandler)>>,
    budget: Duration,
    supervisor: Arc<ProcessSupervisor>,
}

impl CleanupManager {
    pub fn new(supervisor: Arc<ProcessSupervisor>, budget: Duration) -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
            budget,
            supervisor,
        }
    }

    /// Register a teardown handler. Handlers run in the reverse of their
    /// registration order (§4.9 "LIFO") on the next `run` call.
    pub fn register<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: CleanupHandler = Box::new(move || Box::pin(handler()));
        self.handlers.lock().push((name.into(), boxed));
    }

    /// Run every registered handler in LIFO order within the global budget.
    /// If the budget is exceeded, abandons the remaining handlers and falls
    /// back to [`CleanupManager::emergency_kill`] so driver processes never
    /// outlive the engine process regardless of what a misbehaving handler
    /// does (§4.9 "Failure mode").
    pub async fn run(&self) {
        let handlers: Vec<(String, CleanupHandler)> = {
            let mut guard = self.handlers.lock();
            std::mem::take(&mut *guard)
        };

        let run_all = async {
            for (name, handler) in handlers.into_iter().rev() {
                tracing::info!(handler = %name, "running cleanup handler");
                handler().await;
            }
        };

        if tokio::time::timeout(self.budget, run_all).await.is_err() {
            tracing::error!(budget_ms = self.budget.as_millis() as u64, "cleanup budget exceeded, falling back to emergency kill");
            self.emergency_kill().await;
        }
    }

    /// Unconditionally kill every process the supervisor is still tracking,
    /// bypassing graceful `shutdown` RPCs entirely.
    pub async fn emergency_kill(&self) {
        self.supervisor.kill_all().await;
    }
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
