// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `runix feature run` end-to-end specs, including §8 scenario 1 ("Happy
//! echo"): a live driver process, routed through `introspect`-declared
//! steps, executed through the real WebSocket wire protocol.

use crate::support::{cli, has_python3, write_driver};

const ECHO_STEPS: &str = r#"{"id": "s1", "pattern": "I echo {string}", "action": "echo", "parameters": [], "examples": []}"#;

const ECHO_DISPATCH: &str = r#"
def handle_execute(action, args):
    if action == "echo":
        return {"success": True, "data": {"message": args[0] if args else None}}
    return {"success": False, "error": {"code": 99, "message": "unknown action"}}
"#;

#[test]
fn happy_echo_resolves_and_passes() {
    if !has_python3() {
        eprintln!("skipping: python3 not available in this environment");
        return;
    }
    let output_root = tempfile::tempdir().expect("tempdir");
    let drivers = tempfile::tempdir().expect("tempdir");
    write_driver(drivers.path(), "system", ECHO_STEPS, ECHO_DISPATCH);

    let feature_file = output_root.path().join("echo.feature");
    std::fs::write(
        &feature_file,
        "Feature: echoing\n\nScenario: says hi\n  When I echo \"hi\"\n",
    )
    .expect("write feature file");

    let out = cli(output_root.path())
        .env("RUNIX_DRIVER_DIR", drivers.path())
        .args(["feature", "run"])
        .arg(&feature_file)
        .output()
        .expect("run");

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("PASS says hi"), "{stdout}");
    assert!(stdout.contains("[Passed]"), "{stdout}");
}

#[test]
fn unresolved_step_exits_with_the_unresolved_step_code() {
    if !has_python3() {
        eprintln!("skipping: python3 not available in this environment");
        return;
    }
    let output_root = tempfile::tempdir().expect("tempdir");
    let drivers = tempfile::tempdir().expect("tempdir");
    write_driver(drivers.path(), "system", ECHO_STEPS, ECHO_DISPATCH);

    let feature_file = output_root.path().join("mystery.feature");
    std::fs::write(
        &feature_file,
        "Feature: mystery\n\nScenario: nobody understands this\n  When I do a backflip\n",
    )
    .expect("write feature file");

    let out = cli(output_root.path())
        .env("RUNIX_DRIVER_DIR", drivers.path())
        .args(["feature", "run"])
        .arg(&feature_file)
        .output()
        .expect("run");

    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stdout).contains("[Unresolved]"));
}
