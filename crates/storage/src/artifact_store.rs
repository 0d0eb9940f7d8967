// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk layout for one session's artifacts (§4.8, §6.5):
//!
//! ```text
//! <outputRoot>/sessions/<sessionId>/
//!   screenshots/
//!   features/
//!   history.json
//! ```

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use runix_core::{Clock, Session, SessionId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed history.json at {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What a write call hands back: the path used in results (relative to the
/// artifact store's output root) and the bare filename (§4.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub path: PathBuf,
    pub filename: String,
}

/// Writes screenshots, generated feature files, and session history under
/// `<outputRoot>/sessions/<sessionId>/`. Directories are created lazily;
/// every write failure is surfaced as a [`StoreError`], never swallowed
/// (§4.8).
pub struct ArtifactStore<C: Clock> {
    output_root: PathBuf,
    clock: C,
    /// Monotonic counter per session, used to order same-millisecond
    /// writes deterministically (§4.8, §6.5 "an integer counter").
    counters: Mutex<HashMap<SessionId, u64>>,
}

impl<C: Clock> ArtifactStore<C> {
    pub fn new(output_root: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            output_root: output_root.into(),
            clock,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// `sessionDir(sessionId) -> path` (§4.8).
    pub fn session_dir(&self, session_id: SessionId) -> PathBuf {
        self.output_root.join("sessions").join(session_id.as_str())
    }

    fn screenshots_dir(&self, session_id: SessionId) -> PathBuf {
        self.session_dir(session_id).join("screenshots")
    }

    fn features_dir(&self, session_id: SessionId) -> PathBuf {
        self.session_dir(session_id).join("features")
    }

    fn history_path(&self, session_id: SessionId) -> PathBuf {
        self.session_dir(session_id).join("history.json")
    }

    /// `writeScreenshot(sessionId, bytes) -> {path, filename}` (§4.8).
    pub fn write_screenshot(
        &self,
        session_id: SessionId,
        bytes: &[u8],
    ) -> Result<WrittenArtifact, StoreError> {
        let dir = self.screenshots_dir(session_id);
        self.write_artifact(session_id, &dir, "png", bytes)
    }

    /// `writeFeatureFile(sessionId, content) -> {path, filename}` (§4.8).
    pub fn write_feature_file(
        &self,
        session_id: SessionId,
        content: &str,
    ) -> Result<WrittenArtifact, StoreError> {
        let dir = self.features_dir(session_id);
        self.write_artifact(session_id, &dir, "feature", content.as_bytes())
    }

    fn write_artifact(
        &self,
        session_id: SessionId,
        dir: &Path,
        extension: &str,
        bytes: &[u8],
    ) -> Result<WrittenArtifact, StoreError> {
        std::fs::create_dir_all(dir).map_err(|e| StoreError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let filename = self.next_filename(session_id, extension);
        let path = dir.join(&filename);
        std::fs::write(&path, bytes).map_err(|e| StoreError::Write {
            path: path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote artifact");

        Ok(WrittenArtifact {
            path: path
                .strip_prefix(&self.output_root)
                .unwrap_or(&path)
                .to_path_buf(),
            filename,
        })
    }

    /// `<timestamp>-<counter>.<ext>` where the timestamp is the session's
    /// own clock (not wall-clock `Instant`) rendered ISO-8601 with colons
    /// stripped so it is filesystem-safe on every platform (§6.5).
    fn next_filename(&self, session_id: SessionId, extension: &str) -> String {
        let counter = {
            let mut counters = self.counters.lock();
            let entry = counters.entry(session_id).or_insert(0);
            *entry += 1;
            *entry
        };
        let epoch_ms = self.clock.epoch_ms();
        let timestamp = chrono::DateTime::<Utc>::from_timestamp_millis(epoch_ms as i64)
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace(':', "");
        format!("{timestamp}-{counter:04}.{extension}")
    }

    /// Persist `session`'s full history as `history.json`, mirroring the
    /// Session model (§3, §6.5).
    pub fn write_history(&self, session: &Session) -> Result<PathBuf, StoreError> {
        let dir = self.session_dir(session.id);
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::CreateDir {
            path: dir.clone(),
            source: e,
        })?;
        let path = self.history_path(session.id);
        let json = serde_json::to_vec_pretty(session)?;
        std::fs::write(&path, json).map_err(|e| StoreError::Write {
            path: path.clone(),
            source: e,
        })?;
        tracing::debug!(session = %session.id, path = %path.display(), "wrote session history");
        Ok(path)
    }

    pub fn read_history(&self, session_id: SessionId) -> Result<Session, StoreError> {
        let path = self.history_path(session_id);
        let text = std::fs::read_to_string(&path).map_err(|e| StoreError::Read {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| StoreError::Deserialize { path, source: e })
    }
}

#[cfg(test)]
#[path = "artifact_store_tests.rs"]
mod tests;
