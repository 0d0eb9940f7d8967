// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The CLI's own fallible boundary: reading/parsing input on disk before an
//! `Engine` even exists. Driver/session failures are reported through their
//! own result types instead, since those are successful *runs* that ended
//! badly, not errors in the CLI itself (§7).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    ParseFeature {
        path: PathBuf,
        #[source]
        source: runix_core::FeatureParseError,
    },
    #[error("unknown driver {0}")]
    UnknownDriver(runix_core::DriverId),
}
