// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tracing-subscriber` wiring: an `EnvFilter` driven by `LOG_LEVEL`, an
//! optional console layer gated by `LOG_CONSOLE`, and an optional
//! `tracing-appender` rolling file writer when `LOG_FILE` is set (mirrors
//! the teacher's `daemon::main::setup_logging`).

use crate::config::EngineConfig;
use std::ffi::OsStr;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. The returned guard must be held for the
/// life of the process when a file writer was configured — dropping it
/// flushes and stops the non-blocking writer thread.
pub fn setup_logging(config: &EngineConfig) -> io::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let Some(log_file) = &config.log_file else {
        if config.log_console {
            registry.with(fmt::layer()).init();
        } else {
            registry.init();
        }
        return Ok(None);
    };

    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = log_file.parent().unwrap_or_else(|| Path::new("."));
    let filename = log_file.file_name().unwrap_or_else(|| OsStr::new("runix.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, filename));
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    if config.log_console {
        registry.with(fmt::layer()).with(file_layer).init();
    } else {
        registry.with(file_layer).init();
    }
    Ok(Some(guard))
}
