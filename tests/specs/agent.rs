// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `runix agent run` end-to-end specs: §8 scenarios 5 ("Agent completion")
//! and 6 ("Agent budget"), driven through the real CLI against one fake
//! driver process registered under all three roles.

use crate::support::{cli, has_python3, write_driver};

const ONE_PX_DISPATCH_PRELUDE: &str = r#"
import base64
ONE_PX_PNG = base64.b64encode(bytes([0x89, 0x50, 0x4E, 0x47])).decode()
"#;

const COMPLETES_ON_FIRST_ITERATION: &str = r#"
def handle_execute(action, args):
    if action == "takeScreenshot":
        return {"success": True, "data": {"image": ONE_PX_PNG}}
    if action == "analyzeScene":
        return {"success": True, "data": {"elements": []}}
    if action == "analyzeScreenAndDecide":
        return {"success": True, "data": {
            "reasoning": "done",
            "action": {"type": "task_complete"},
            "isComplete": True,
        }}
    return {"success": True, "data": {}}
"#;

const NEVER_COMPLETES: &str = r#"
def handle_execute(action, args):
    if action == "takeScreenshot":
        return {"success": True, "data": {"image": ONE_PX_PNG}}
    if action == "analyzeScene":
        return {"success": True, "data": {"elements": []}}
    if action == "analyzeScreenAndDecide":
        return {"success": True, "data": {
            "reasoning": "keep going",
            "action": {"type": "wait", "duration": 1},
            "isComplete": False,
        }}
    return {"success": True, "data": {}}
"#;

fn dispatch(program: &str) -> String {
    format!("{ONE_PX_DISPATCH_PRELUDE}\n{program}")
}

/// Registers one fake driver process under `system`, `vision`, and `llm`
/// manifest names under the same search root, mirroring the per-crate
/// `AgentLoop` fixture (§4.7 only ever addresses one `DriverId` per role).
fn write_three_role_driver(root: &std::path::Path, program: &str) {
    let rendered = dispatch(program);
    write_driver(root, "system", "", &rendered);
    write_driver(root, "vision", "", &rendered);
    write_driver(root, "llm", "", &rendered);
}

#[test]
fn session_completes_at_iteration_one_when_the_llm_signals_done() {
    if !has_python3() {
        eprintln!("skipping: python3 not available in this environment");
        return;
    }
    let output_root = tempfile::tempdir().expect("tempdir");
    let drivers = tempfile::tempdir().expect("tempdir");
    write_three_role_driver(drivers.path(), COMPLETES_ON_FIRST_ITERATION);

    let out = cli(output_root.path())
        .env("RUNIX_DRIVER_DIR", drivers.path())
        .env("RUNIX_MAX_ITERATIONS", "3")
        .args([
            "agent", "run", "--goal", "say hi", "--system", "system", "--vision", "vision", "--llm", "llm",
        ])
        .output()
        .expect("run");

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("ended completed"));
}

#[test]
fn session_fails_with_iteration_budget_exceeded_after_max_iterations() {
    if !has_python3() {
        eprintln!("skipping: python3 not available in this environment");
        return;
    }
    let output_root = tempfile::tempdir().expect("tempdir");
    let drivers = tempfile::tempdir().expect("tempdir");
    write_three_role_driver(drivers.path(), NEVER_COMPLETES);

    let out = cli(output_root.path())
        .env("RUNIX_DRIVER_DIR", drivers.path())
        .env("RUNIX_MAX_ITERATIONS", "3")
        .env("RUNIX_ITERATION_DELAY_MS", "0")
        .args([
            "agent", "run", "--goal", "never finishes", "--system", "system", "--vision", "vision", "--llm", "llm",
        ])
        .output()
        .expect("run");

    assert_eq!(out.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("ended failed"), "{stdout}");
    assert!(stdout.contains("iteration_budget_exceeded"), "{stdout}");
}

#[test]
fn unknown_driver_role_is_an_init_failure() {
    let output_root = tempfile::tempdir().expect("tempdir");
    let drivers = tempfile::tempdir().expect("tempdir");

    let out = cli(output_root.path())
        .env("RUNIX_DRIVER_DIR", drivers.path())
        .args([
            "agent", "run", "--goal", "anything", "--system", "ghost", "--vision", "ghost", "--llm", "ghost",
        ])
        .output()
        .expect("run");

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown driver"));
}
