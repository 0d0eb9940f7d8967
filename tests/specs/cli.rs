// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI surface specs: help output and argument parsing, no driver required.

use crate::support::cli;

#[test]
fn no_args_shows_usage_and_exits_nonzero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = cli(dir.path()).output().expect("run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage:"));
}

#[test]
fn help_lists_every_subcommand() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = cli(dir.path()).arg("--help").output().expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["registry", "feature", "agent"] {
        assert!(stdout.contains(name), "help output missing {name}: {stdout}");
    }
}

#[test]
fn registry_help_shows_discover_subcommand() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = cli(dir.path()).args(["registry", "--help"]).output().expect("run");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("discover"));
}

#[test]
fn feature_run_on_missing_file_is_an_init_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = cli(dir.path())
        .args(["feature", "run", "no-such-file.feature"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read"));
}
