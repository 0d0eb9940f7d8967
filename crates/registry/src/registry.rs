// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry (C4): discovers driver manifests on disk, starts/stops drivers
//! on demand, and yields a live [`DriverClient`] by id (§4.4).

use crate::discover::{discover, DiscoveredManifest, DiscoveryError, MANIFEST_FILENAME};
use crate::router::StepRouter;
use parking_lot::Mutex as SyncMutex;
use runix_adapters::client::{ClientConfig, ClientError, DriverClient};
use runix_adapters::supervisor::{ProcessSupervisor, SupervisorError};
use runix_core::{DriverId, DriverManifest, DriverRecord, StepDefinition, StopReason, Transport};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("driver {0} is not known to the registry")]
    UnknownDriver(DriverId),
    #[error("driver {0} declares unsupported transport {1:?}")]
    UnsupportedTransport(DriverId, Transport),
    #[error("driver {0} manifest names a missing executable: {1}")]
    MissingExecutable(DriverId, String),
    #[error("driver startup error: {0}")]
    Startup(#[from] SupervisorError),
    #[error("driver communication error: {0}")]
    Communication(#[from] ClientError),
    #[error("malformed step table from driver {0}: {1}")]
    MalformedSteps(DriverId, String),
}

struct DriverEntry {
    record: DriverRecord,
    manifest_dir: PathBuf,
}

/// Live registry of discovered and running drivers. Shared by every caller
/// that needs a driver client; this struct is the sole owner of each
/// client's lifetime (§4.4 "Shared ownership") — callers must not close one
/// themselves.
pub struct Registry {
    supervisor: Arc<ProcessSupervisor>,
    router: Arc<StepRouter>,
    client_config: ClientConfig,
    entries: SyncMutex<HashMap<DriverId, DriverEntry>>,
    clients: SyncMutex<HashMap<DriverId, Arc<DriverClient>>>,
    /// Per-id start lock so two concurrent `instance()` callers never race
    /// to spawn the same driver twice (§5 "guards per-id startup").
    start_locks: SyncMutex<HashMap<DriverId, Arc<AsyncMutex<()>>>>,
    discovery_errors: SyncMutex<Vec<DiscoveryError>>,
}

impl Registry {
    pub fn new(supervisor: Arc<ProcessSupervisor>, router: Arc<StepRouter>) -> Self {
        Self::with_client_config(supervisor, router, ClientConfig::default())
    }

    pub fn with_client_config(
        supervisor: Arc<ProcessSupervisor>,
        router: Arc<StepRouter>,
        client_config: ClientConfig,
    ) -> Self {
        Self {
            supervisor,
            router,
            client_config,
            entries: SyncMutex::new(HashMap::new()),
            clients: SyncMutex::new(HashMap::new()),
            start_locks: SyncMutex::new(HashMap::new()),
            discovery_errors: SyncMutex::new(Vec::new()),
        }
    }

    /// Scan `search_paths` for manifests and (re)populate the in-memory
    /// table. Idempotent: a manifest already known keeps its `DriverId` and
    /// running client; only its declared manifest fields are refreshed.
    /// Invalid manifests never abort discovery — they accumulate in
    /// [`Registry::discovery_errors`] (§4.4).
    pub fn discover(&self, search_paths: &[PathBuf]) {
        let (found, errors) = discover(search_paths);
        *self.discovery_errors.lock() = errors;

        let mut entries = self.entries.lock();
        for DiscoveredManifest { manifest, dir } in found {
            // The id is derived from the manifest name, not generated
            // randomly, so repeated discovery of the same manifest yields
            // the same id (§8 "discover called twice... produces the same
            // set of driver ids").
            let id = DriverId::from_string(&manifest.name);
            match entries.get_mut(&id) {
                Some(entry) => {
                    entry.record.manifest = manifest;
                    entry.manifest_dir = dir;
                }
                None => {
                    entries.insert(
                        id,
                        DriverEntry {
                            record: DriverRecord::discovered(id, manifest),
                            manifest_dir: dir,
                        },
                    );
                }
            }
        }
    }

    /// Non-fatal errors accumulated by the most recent `discover` call.
    pub fn discovery_errors(&self) -> Vec<DiscoveryError> {
        self.discovery_errors.lock().clone()
    }

    /// Snapshot of every known driver record, sorted by id for a stable
    /// iteration order.
    pub fn list(&self) -> Vec<DriverRecord> {
        let mut records: Vec<DriverRecord> =
            self.entries.lock().values().map(|e| e.record.clone()).collect();
        records.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        records
    }

    pub fn get(&self, id: &DriverId) -> Option<DriverRecord> {
        self.entries.lock().get(id).map(|e| e.record.clone())
    }

    /// Return the Ready client for `id`, starting the driver on demand if
    /// it is not already running (§4.4 "On-demand start"). Shared by every
    /// caller; the Registry alone owns the client's lifetime.
    pub async fn instance(&self, id: DriverId) -> Result<Arc<DriverClient>, RegistryError> {
        if let Some(client) = self.existing_usable_client(&id) {
            return Ok(client);
        }

        let lock = self.start_lock_for(id);
        let _guard = lock.lock().await;

        // Re-check: another caller may have finished starting it while we
        // waited for the lock.
        if let Some(client) = self.existing_usable_client(&id) {
            return Ok(client);
        }

        // A client exists but its connection was lost: try to heal it
        // before falling back to a full restart (§4.2 "Reconnect policy").
        if let Some(client) = self.reconnect_stale_client(&id).await {
            return Ok(client);
        }

        self.start_driver(id).await
    }

    /// A client is already tracked for `id` but disconnected: mark the
    /// record `Unhealthy` and attempt `DriverClient::reconnect`. On success
    /// the record returns to `Ready` with its existing `pid`/`port`. On
    /// exhaustion, the stale process is killed so the caller's subsequent
    /// `start_driver` restart doesn't leak it, and the record is left
    /// `Unhealthy` for `start_driver` to move through `Starting` -> `Ready`.
    async fn reconnect_stale_client(&self, id: &DriverId) -> Option<Arc<DriverClient>> {
        let client = self.clients.lock().get(id).cloned()?;
        if client.is_connected() {
            return Some(client);
        }

        if let Some(entry) = self.entries.lock().get_mut(id) {
            entry.record.mark_unhealthy();
        }

        match client.reconnect().await {
            Ok(()) => {
                if let Some(entry) = self.entries.lock().get_mut(id) {
                    entry.record.mark_reconnected();
                }
                Some(client)
            }
            Err(e) => {
                tracing::warn!(driver = %id, error = %e, "reconnect exhausted, restarting driver");
                self.clients.lock().remove(id);
                self.supervisor.kill(id).await;
                None
            }
        }
    }

    async fn start_driver(&self, id: DriverId) -> Result<Arc<DriverClient>, RegistryError> {
        let (manifest, manifest_dir) = {
            let mut entries = self.entries.lock();
            let entry = entries.get_mut(&id).ok_or(RegistryError::UnknownDriver(id))?;
            if !entry.record.manifest.transport.is_supported() {
                return Err(RegistryError::UnsupportedTransport(
                    id,
                    entry.record.manifest.transport,
                ));
            }
            entry.record.mark_starting();
            (entry.record.manifest.clone(), entry.manifest_dir.clone())
        };

        let resolved_exe = manifest.resolved_executable(&manifest_dir);
        if !resolved_exe.exists() {
            self.mark_stopped(id, StopReason::SpawnFailed("missing executable".into()));
            return Err(RegistryError::MissingExecutable(
                id,
                resolved_exe.display().to_string(),
            ));
        }

        let started = match self.supervisor.start(id, &manifest, &manifest_dir).await {
            Ok(started) => started,
            Err(e) => {
                let reason = match &e {
                    SupervisorError::PortNeverAccepted => StopReason::PortNeverAccepted,
                    other => StopReason::SpawnFailed(other.to_string()),
                };
                self.mark_stopped(id, reason);
                return Err(e.into());
            }
        };

        let url = format!("ws://127.0.0.1:{}/", started.port);
        let client = match DriverClient::connect(id, url, self.client_config.clone()).await {
            Ok(client) => Arc::new(client),
            Err(e) => {
                self.supervisor.kill(&id).await;
                self.mark_stopped(id, StopReason::HandshakeFailed(e.to_string()));
                return Err(e.into());
            }
        };

        if let Err(e) = client.capabilities().await {
            self.supervisor.kill(&id).await;
            self.mark_stopped(id, StopReason::HandshakeFailed(e.to_string()));
            return Err(e.into());
        }

        let _ = client.initialize(serde_json::json!({})).await;

        if let Ok(steps_response) = client.introspect("steps").await {
            match parse_step_table(&steps_response) {
                Ok(steps) => {
                    if let Err(e) = self.router.register_steps(id, steps) {
                        tracing::warn!(driver = %id, error = %e, "step registration failed");
                    }
                }
                Err(message) => {
                    tracing::warn!(driver = %id, %message, "malformed step table, ignoring");
                }
            }
        }

        {
            let mut entries = self.entries.lock();
            if let Some(entry) = entries.get_mut(&id) {
                entry
                    .record
                    .mark_ready(started.pid, started.port, started.instance_id.to_string());
            }
        }
        self.clients.lock().insert(id, client.clone());
        Ok(client)
    }

    fn existing_usable_client(&self, id: &DriverId) -> Option<Arc<DriverClient>> {
        let client = self.clients.lock().get(id).cloned()?;
        if client.is_connected() {
            Some(client)
        } else {
            None
        }
    }

    fn start_lock_for(&self, id: DriverId) -> Arc<AsyncMutex<()>> {
        self.start_locks
            .lock()
            .entry(id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn mark_stopped(&self, id: DriverId, reason: StopReason) {
        if let Some(entry) = self.entries.lock().get_mut(&id) {
            entry.record.mark_stopped(reason);
        }
        self.router.unregister(&id);
    }

    /// Stop every running driver (§4.4 `stopAll`). Best-effort; failures to
    /// stop one driver do not prevent stopping the rest.
    pub async fn stop_all(&self) {
        let ids: Vec<DriverId> = self.clients.lock().keys().copied().collect();
        for id in ids {
            let client = self.clients.lock().remove(&id);
            if let Err(e) = self
                .supervisor
                .stop(&id, client.as_deref())
                .await
            {
                tracing::warn!(driver = %id, error = %e, "error stopping driver");
            }
            self.mark_stopped(id, StopReason::Requested);
        }
    }

    pub fn supervisor(&self) -> &Arc<ProcessSupervisor> {
        &self.supervisor
    }

    pub fn router(&self) -> &Arc<StepRouter> {
        &self.router
    }
}

fn parse_step_table(value: &serde_json::Value) -> Result<Vec<StepDefinition>, String> {
    let steps = value
        .get("steps")
        .cloned()
        .unwrap_or_else(|| value.clone());
    serde_json::from_value(steps).map_err(|e| e.to_string())
}

/// Also implement discovery over a manifest already resolved to absolute
/// paths, used by callers that assemble manifests from something other
/// than a flat filesystem scan (e.g. tests).
impl Registry {
    pub fn insert_manifest(&self, manifest: DriverManifest, manifest_dir: PathBuf) -> DriverId {
        let id = DriverId::from_string(&manifest.name);
        self.entries.lock().insert(
            id,
            DriverEntry {
                record: DriverRecord::discovered(id, manifest),
                manifest_dir,
            },
        );
        id
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
