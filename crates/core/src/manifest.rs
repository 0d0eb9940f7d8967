// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver manifest — the on-disk JSON description of a driver (§3, §6.2).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Transport a driver speaks. This spec mandates `Websocket`; the others are
/// recognized on parse (so a manifest naming them is discovered, not
/// rejected) but the registry refuses to start them (§3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Websocket,
    Stdio,
    Http,
    Tcp,
}

impl Transport {
    pub fn is_supported(self) -> bool {
        matches!(self, Transport::Websocket)
    }
}

/// One step pattern embedded in a manifest (`introspect(steps)` mirrors this
/// shape so a driver can declare its steps statically instead of, or in
/// addition to, returning them at runtime).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestStep {
    pub id: String,
    pub pattern: String,
    pub action: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ManifestStepParam>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestStepParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

/// Driver manifest as discovered on disk (§3).
///
/// Unknown fields are preserved via `extra` so a forward-compatible manifest
/// round-trips through parse → serialize without losing information (§8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    /// Path to the driver executable, relative to the manifest file.
    pub executable: PathBuf,
    pub transport: Transport,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub steps: Vec<ManifestStep>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    /// Unknown top-level fields, preserved verbatim (§6.2: "Unknown fields
    /// are preserved and ignored").
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DriverManifest {
    /// Parse a manifest from its on-disk JSON text.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Resolve `executable` against the directory containing the manifest
    /// file. Does not check existence — discovery reports a missing
    /// executable as a configuration error rather than silently skipping the
    /// manifest (§3 invariant).
    pub fn resolved_executable(&self, manifest_dir: &Path) -> PathBuf {
        if self.executable.is_absolute() {
            self.executable.clone()
        } else {
            manifest_dir.join(&self.executable)
        }
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
