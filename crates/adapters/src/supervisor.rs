// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process Supervisor (C3): spawns driver executables, injects the ephemeral
//! port, captures stdio, watches liveness, and kills orphans on exit.

use crate::client::{ClientConfig, DriverClient};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use runix_core::{DriverId, DriverManifest};
use std::collections::{HashMap, VecDeque};
use std::net::TcpListener as StdTcpListener;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to spawn driver process: {0}")]
    SpawnFailed(String),
    #[error("driver never accepted a connection on its port")]
    PortNeverAccepted,
    #[error("driver handshake failed: {0}")]
    HandshakeFailed(String),
    #[error("driver {0} is not tracked by this supervisor")]
    Unknown(DriverId),
}

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub startup_timeout: Duration,
    pub stop_grace: Duration,
    pub stdio_tail_lines: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(10),
            stop_grace: Duration::from_secs(5),
            stdio_tail_lines: 200,
        }
    }
}

/// What `start` handed back: enough to build a [`DriverClient`] and to
/// record the driver's `pid`/`port` in its `DriverRecord`.
pub struct StartedDriver {
    pub pid: u32,
    pub port: u16,
    pub instance_id: Uuid,
}

struct ManagedProcess {
    child: Child,
    tail: Arc<Mutex<VecDeque<String>>>,
}

/// Owns the OS-level lifetime of every spawned driver process, keyed by
/// driver id. C9 iterates this table on shutdown.
pub struct ProcessSupervisor {
    config: SupervisorConfig,
    processes: Mutex<HashMap<DriverId, ManagedProcess>>,
}

impl ProcessSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            processes: Mutex::new(HashMap::new()),
        }
    }

    /// Spawn `manifest`'s executable, wait for it to accept the ephemeral
    /// port, and return enough to build a client. Any failure leaves no
    /// entry in the process table.
    pub async fn start(
        &self,
        id: DriverId,
        manifest: &DriverManifest,
        manifest_dir: &std::path::Path,
    ) -> Result<StartedDriver, SupervisorError> {
        let port = reserve_ephemeral_port()
            .map_err(|e| SupervisorError::SpawnFailed(format!("port reservation failed: {e}")))?;
        let instance_id = Uuid::new_v4();

        let executable = manifest.resolved_executable(manifest_dir);
        let mut command = Command::new(&executable);
        command
            .env("RUNIX_DRIVER_PORT", port.to_string())
            .env("RUNIX_DRIVER_INSTANCE_ID", instance_id.to_string())
            .env("RUNIX_DRIVER_LOG_LEVEL", "info")
            .current_dir(manifest_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| {
            SupervisorError::SpawnFailed(format!("{}: {e}", executable.display()))
        })?;
        let pid = child.id().ok_or_else(|| {
            SupervisorError::SpawnFailed("process exited before pid was available".into())
        })?;

        let tail = Arc::new(Mutex::new(VecDeque::with_capacity(self.config.stdio_tail_lines)));
        spawn_stdio_capture(&mut child, tail.clone(), self.config.stdio_tail_lines);

        if !wait_for_port(port, self.config.startup_timeout).await {
            let _ = child.kill().await;
            let tail_text = drain_tail(&tail).await;
            tracing::error!(driver = %id, port, tail = %tail_text, "driver never accepted connection");
            return Err(SupervisorError::PortNeverAccepted);
        }

        self.processes
            .lock()
            .await
            .insert(id, ManagedProcess { child, tail });

        Ok(StartedDriver { pid, port, instance_id })
    }

    /// `stop(pid, grace)`: best-effort `shutdown` RPC, wait up to `grace`,
    /// then SIGTERM; falls back to `kill` if the process is still alive
    /// after the grace period elapses.
    pub async fn stop(&self, id: &DriverId, client: Option<&DriverClient>) -> Result<(), SupervisorError> {
        if let Some(client) = client {
            client.shutdown().await;
        }

        let pid = {
            let processes = self.processes.lock().await;
            let managed = processes.get(id).ok_or_else(|| SupervisorError::Unknown(*id))?;
            managed.child.id()
        };

        if let Some(pid) = pid {
            tokio::time::sleep(self.config.stop_grace).await;
            if self.is_alive(id).await {
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        }

        if self.is_alive(id).await {
            self.kill(id).await;
        } else {
            self.processes.lock().await.remove(id);
        }
        Ok(())
    }

    /// `kill(pid)` — forcible termination, used directly and as the `stop`
    /// fallback. Always closes stdio to avoid zombie pipes.
    pub async fn kill(&self, id: &DriverId) {
        let mut processes = self.processes.lock().await;
        if let Some(mut managed) = processes.remove(id) {
            if let Some(pid) = managed.child.id() {
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
            }
            let _ = managed.child.kill().await;
            let _ = managed.child.wait().await;
        }
    }

    pub async fn is_alive(&self, id: &DriverId) -> bool {
        let mut processes = self.processes.lock().await;
        match processes.get_mut(id) {
            Some(managed) => matches!(managed.child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// The last `stdio_tail_lines` lines of combined stdout/stderr, used to
    /// enrich a "driver startup error" report.
    pub async fn stdio_tail(&self, id: &DriverId) -> Option<Vec<String>> {
        let processes = self.processes.lock().await;
        let managed = processes.get(id)?;
        let tail = managed.tail.lock().await;
        Some(tail.iter().cloned().collect())
    }

    /// C9 entry point: kill every tracked process regardless of state.
    pub async fn kill_all(&self) {
        let ids: Vec<DriverId> = self.processes.lock().await.keys().copied().collect();
        for id in ids {
            self.kill(&id).await;
        }
    }
}

fn reserve_ephemeral_port() -> std::io::Result<u16> {
    let listener = StdTcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

async fn wait_for_port(port: u16, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

fn spawn_stdio_capture(child: &mut Child, tail: Arc<Mutex<VecDeque<String>>>, cap: usize) {
    use tokio::io::{AsyncBufReadExt, BufReader};

    if let Some(stdout) = child.stdout.take() {
        let tail = tail.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                push_tail(&tail, line, cap).await;
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                push_tail(&tail, line, cap).await;
            }
        });
    }
}

async fn push_tail(tail: &Arc<Mutex<VecDeque<String>>>, line: String, cap: usize) {
    let mut tail = tail.lock().await;
    if tail.len() >= cap {
        tail.pop_front();
    }
    tail.push_back(line);
}

async fn drain_tail(tail: &Arc<Mutex<VecDeque<String>>>) -> String {
    let tail = tail.lock().await;
    tail.iter().cloned().collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
