// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! End-to-end tests driving the `shmlink` binary.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Output, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use shmlink_core::{BackendKind, Region, RegionOptions};
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_shmlink");

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn unique(prefix: &str) -> String {
    format!(
        "cli-{}-{}-{}",
        prefix,
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

fn shmlink(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .output()
        .expect("Failed to run shmlink")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Spawn `shmlink create --hold` and wait until it reports the region.
fn spawn_holder(name: &str, payload: usize, backend: &str) -> Child {
    let mut child = Command::new(BIN)
        .args([
            "--backend",
            backend,
            "create",
            name,
            "--payload",
            &payload.to_string(),
            "--hold",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn holder");

    let stdout = child.stdout.take().expect("stdout is piped");
    let mut lines = BufReader::new(stdout).lines();
    let first = lines
        .next()
        .expect("holder exited early")
        .expect("holder output");
    assert!(first.contains("Created"), "unexpected output: {}", first);

    // Keep draining so later prints never hit a closed pipe.
    std::thread::spawn(move || lines.for_each(drop));
    child
}

fn interrupt(mut child: Child) {
    kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).expect("Failed to signal holder");

    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(10) {
        if let Some(status) = child.try_wait().expect("wait failed") {
            assert!(status.success(), "holder exited with {}", status);
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    let _ = child.kill();
    panic!("holder did not exit after SIGINT");
}

#[test]
fn test_validate_accepts_good_config() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("shmlink.yaml");
    std::fs::write(
        &path,
        "backend: posix\nregions:\n  - name: telemetry\n    payload_bytes: 16\n",
    )
    .unwrap();

    let output = shmlink(&["validate", path.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout_of(&output);
    assert!(text.contains("Configuration is valid"));
    assert!(text.contains("telemetry (payload: 16 bytes"));
}

#[test]
fn test_validate_rejects_bad_config() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("shmlink.yaml");
    std::fs::write(&path, "regions: []\n").unwrap();

    let output = shmlink(&["validate", path.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn test_create_without_hold_releases() {
    let name = unique("oneshot");
    let output = shmlink(&["create", &name, "--payload", "8"]);
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Released"));

    let err = Region::attach(&name).unwrap_err();
    assert_eq!(err.kind(), shmlink_core::ErrorKind::NotFound);
}

#[test]
fn test_commands_on_missing_region_fail() {
    let name = unique("absent");
    assert!(!shmlink(&["get-scalar", &name]).status.success());
    assert!(!shmlink(&["inspect", &name]).status.success());
}

#[test]
fn test_held_region_round_trip() {
    for backend in ["posix", "sysv"] {
        let name = unique(&format!("held-{}", backend));
        let holder = spawn_holder(&name, 4, backend);

        let out = shmlink(&["--backend", backend, "put-scalar", &name, "2.5"]);
        assert!(out.status.success());
        let out = shmlink(&["--backend", backend, "get-scalar", &name]);
        assert_eq!(stdout_of(&out), "2.5");

        let out = shmlink(&["--backend", backend, "put-payload", &name, "deadbeef"]);
        assert!(out.status.success());
        let out = shmlink(&["--backend", backend, "get-payload", &name]);
        assert_eq!(stdout_of(&out), "deadbeef");

        // Wrong length is refused before touching the region.
        let out = shmlink(&["--backend", backend, "put-payload", &name, "00"]);
        assert!(!out.status.success());

        let out = shmlink(&["--backend", backend, "lam", &name]);
        assert_eq!(stdout_of(&out), "true");
        let out = shmlink(&["--backend", backend, "lam", &name, "--set", "false"]);
        assert_eq!(stdout_of(&out), "false");

        let out = shmlink(&["--backend", backend, "inspect", &name, "--json"]);
        assert!(out.status.success());
        let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
        assert_eq!(report["payload_size"], 4);
        assert_eq!(report["header"]["scalar"], 2.5);
        assert_eq!(report["header"]["notify"], false);
        assert_eq!(
            report["payload_crc32"],
            u64::from(crc32fast::hash(&[0xde, 0xad, 0xbe, 0xef]))
        );

        // A library handle sees the same bytes.
        let kind: BackendKind = backend.parse().unwrap();
        let region = Region::attach_with(&name, RegionOptions::new().backend(kind)).unwrap();
        assert_eq!(region.read_payload().unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        drop(region);

        interrupt(holder);
        assert!(Region::attach_with(&name, RegionOptions::new().backend(kind)).is_err());
    }
}

#[test]
fn test_cleanup_of_absent_region_succeeds() {
    let name = unique("clean");
    let output = shmlink(&["cleanup", &name]);
    assert!(output.status.success());
    let text = stdout_of(&output);
    assert!(text.contains("store:     absent"));
    assert!(text.contains("semaphore: absent"));
}
