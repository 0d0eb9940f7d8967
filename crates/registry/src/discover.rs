// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manifest discovery (§4.4 "Discovery").
//!
//! Each search path is scanned one directory deep for subdirectories
//! containing `manifest.json`. A manifest naming a missing `executable` is
//! still discovered (§3 invariant: "must be reported, not silently
//! skipped") — the missing-executable check happens at `start` time, not
//! here; this module only reports manifests that fail to *parse*.

use runix_core::DriverManifest;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILENAME: &str = "manifest.json";

/// One manifest found on disk, keyed by its containing directory.
#[derive(Debug, Clone)]
pub struct DiscoveredManifest {
    pub manifest: DriverManifest,
    pub dir: PathBuf,
}

/// A manifest file that exists but failed to parse, or a search path that
/// could not be read. Collected, never thrown (§4.4).
#[derive(Debug, Clone)]
pub struct DiscoveryError {
    pub path: PathBuf,
    pub message: String,
}

/// Scan every path in `search_paths` one directory deep for subdirectories
/// containing `manifest.json`. Deterministic: entries within a path are
/// sorted by directory name, and `search_paths` are scanned in the order
/// given, so calling `discover` twice on the same paths yields the same
/// manifest list in the same order (§8 "Registry discover called twice...").
pub fn discover(search_paths: &[PathBuf]) -> (Vec<DiscoveredManifest>, Vec<DiscoveryError>) {
    let mut found = Vec::new();
    let mut errors = Vec::new();

    for search_path in search_paths {
        let entries = match fs::read_dir(search_path) {
            Ok(entries) => entries,
            Err(e) => {
                errors.push(DiscoveryError {
                    path: search_path.clone(),
                    message: format!("cannot read search path: {e}"),
                });
                continue;
            }
        };

        let mut subdirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        subdirs.sort();

        for dir in subdirs {
            scan_one(&dir, &mut found, &mut errors);
        }
    }

    (found, errors)
}

fn scan_one(dir: &Path, found: &mut Vec<DiscoveredManifest>, errors: &mut Vec<DiscoveryError>) {
    let manifest_path = dir.join(MANIFEST_FILENAME);
    if !manifest_path.is_file() {
        return;
    }
    let text = match fs::read_to_string(&manifest_path) {
        Ok(text) => text,
        Err(e) => {
            errors.push(DiscoveryError {
                path: manifest_path,
                message: format!("cannot read manifest: {e}"),
            });
            return;
        }
    };
    match DriverManifest::parse(&text) {
        Ok(manifest) => found.push(DiscoveredManifest {
            manifest,
            dir: dir.to_path_buf(),
        }),
        Err(e) => errors.push(DiscoveryError {
            path: manifest_path,
            message: format!("invalid manifest: {e}"),
        }),
    }
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
