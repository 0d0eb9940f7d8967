// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine facade: wires the Registry, Feature Executor, Artifact Store, and
//! Cleanup Manager together from one [`EngineConfig`] so the CLI doesn't
//! have to know the wiring order.

use crate::cleanup::CleanupManager;
use crate::config::EngineConfig;
use runix_adapters::supervisor::ProcessSupervisor;
use runix_core::SystemClock;
use runix_engine::FeatureExecutor;
use runix_registry::{Registry, StepRouter};
use runix_storage::ArtifactStore;
use std::sync::Arc;

/// Everything a CLI command needs, already discovered and ready to use.
/// `cleanup` has `stop_all_drivers` pre-registered; callers add their own
/// handlers (e.g. an open session's history flush) before installing signal
/// handlers or calling `cleanup.run()` directly.
pub struct Engine {
    pub config: EngineConfig,
    pub registry: Arc<Registry>,
    pub feature_executor: Arc<FeatureExecutor>,
    pub artifact_store: Arc<ArtifactStore<SystemClock>>,
    pub cleanup: Arc<CleanupManager>,
}

impl Engine {
    /// Build every component from `config` and run driver discovery once.
    /// Discovery errors are non-fatal and available via
    /// `registry.discovery_errors()`.
    pub fn bootstrap(config: EngineConfig) -> Self {
        let supervisor = Arc::new(ProcessSupervisor::new(config.supervisor_config()));
        let router = Arc::new(StepRouter::new());
        let registry = Arc::new(Registry::with_client_config(
            supervisor.clone(),
            router,
            config.client_config(),
        ));
        registry.discover(&config.search_paths);

        let feature_executor = Arc::new(FeatureExecutor::new(
            registry.clone(),
            config.feature_executor_config(),
        ));
        let artifact_store = Arc::new(ArtifactStore::new(config.output_root.clone(), SystemClock));

        let cleanup = Arc::new(CleanupManager::new(supervisor, config.cleanup_budget));
        let cleanup_registry = registry.clone();
        cleanup.register("stop_all_drivers", move || {
            let registry = cleanup_registry.clone();
            async move { registry.stop_all().await }
        });

        Self {
            config,
            registry,
            feature_executor,
            artifact_store,
            cleanup,
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
