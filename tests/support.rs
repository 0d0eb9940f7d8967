// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the workspace-level specs: invoking the compiled
//! `runix` binary and writing minimal driver fixtures on disk so the CLI
//! can be driven end-to-end without a real browser/OS/LLM driver.

use assert_cmd::Command;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// A fresh `runix` invocation pointed at an isolated `RUNIX_OUTPUT_ROOT` so
/// session artifacts never touch the real `$HOME`.
pub fn cli(output_root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("runix").expect("runix binary built by this workspace");
    cmd.env("RUNIX_OUTPUT_ROOT", output_root);
    cmd.env_remove("RUNIX_DRIVER_DIR");
    cmd
}

pub fn has_python3() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Stdlib-only Python WebSocket driver. `dispatch` is inlined Python source
/// defining `handle_execute(action, args)`; everything else (handshake,
/// framing, `capabilities`/`initialize`/`introspect`) is fixed scaffolding
/// shared by every fixture so each spec only states its own behavior.
pub fn driver_script(introspect_steps: &str, dispatch: &str) -> String {
    format!(
        r#"#!/usr/bin/env python3
import socket, os, hashlib, base64, struct, json

GUID = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11"

def handshake(conn):
    data = b""
    while b"\r\n\r\n" not in data:
        data += conn.recv(4096)
    key = None
    for line in data.decode(errors="ignore").split("\r\n"):
        if line.lower().startswith("sec-websocket-key:"):
            key = line.split(":", 1)[1].strip()
    accept = base64.b64encode(hashlib.sha1((key + GUID).encode()).digest()).decode()
    conn.sendall((
        "HTTP/1.1 101 Switching Protocols\r\n"
        "Upgrade: websocket\r\n"
        "Connection: Upgrade\r\n"
        "Sec-WebSocket-Accept: " + accept + "\r\n\r\n"
    ).encode())

def recv_frame(conn):
    hdr = conn.recv(2)
    if len(hdr) < 2:
        return None
    b1, b2 = hdr[0], hdr[1]
    opcode = b1 & 0x0F
    masked = b2 & 0x80
    length = b2 & 0x7F
    if length == 126:
        length = struct.unpack(">H", conn.recv(2))[0]
    elif length == 127:
        length = struct.unpack(">Q", conn.recv(8))[0]
    mask_key = conn.recv(4) if masked else None
    payload = b""
    while len(payload) < length:
        payload += conn.recv(length - len(payload))
    if mask_key:
        payload = bytes(b ^ mask_key[i % 4] for i, b in enumerate(payload))
    if opcode == 0x8:
        return None
    return payload

def send_frame(conn, text):
    payload = text.encode()
    length = len(payload)
    header = bytearray([0x81])
    if length <= 125:
        header.append(length)
    elif length <= 0xFFFF:
        header.append(126)
        header += struct.pack(">H", length)
    else:
        header.append(127)
        header += struct.pack(">Q", length)
    conn.sendall(bytes(header) + payload)

{dispatch}

def main():
    port = int(os.environ["RUNIX_DRIVER_PORT"])
    srv = socket.socket(socket.AF_INET, socket.SOCK_STREAM)
    srv.setsockopt(socket.SOL_SOCKET, socket.SO_REUSEADDR, 1)
    srv.bind(("127.0.0.1", port))
    srv.listen(5)
    while True:
        conn, _ = srv.accept()
        try:
            handshake(conn)
            while True:
                payload = recv_frame(conn)
                if payload is None:
                    break
                msg = json.loads(payload.decode())
                method = msg.get("method")
                if method == "introspect":
                    result = {{"steps": [{introspect_steps}]}}
                elif method == "capabilities":
                    result = {{"name": "fake"}}
                elif method == "initialize":
                    result = {{"initialized": True}}
                elif method == "execute":
                    action = msg["params"]["action"]
                    args = msg["params"]["args"]
                    result = handle_execute(action, args)
                else:
                    result = {{}}
                send_frame(conn, json.dumps({{"id": msg["id"], "type": "response", "result": result}}))
        except Exception:
            pass
        finally:
            conn.close()

if __name__ == "__main__":
    main()
"#
    )
}

/// Write `<root>/<name>/manifest.json` + `<root>/<name>/driver.py` — one
/// discoverable driver directory (§4.4 "scanned one directory deep").
pub fn write_driver(root: &Path, name: &str, introspect_steps: &str, dispatch: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).expect("mkdir driver dir");

    let script_path = dir.join("driver.py");
    let mut file = std::fs::File::create(&script_path).expect("create script");
    file.write_all(driver_script(introspect_steps, dispatch).as_bytes())
        .expect("write script");
    let mut perms = file.metadata().expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script_path, perms).expect("chmod");

    let manifest = serde_json::json!({
        "name": name,
        "version": "1.0.0",
        "executable": "./driver.py",
        "transport": "websocket",
    });
    std::fs::write(dir.join("manifest.json"), manifest.to_string()).expect("write manifest");
    dir
}
