//! Integration tests for the `edgemax-exporter` binary.
//!
//! These cover argument parsing, configuration errors and connection
//! failures, all without a live appliance.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the binary with env isolation.
///
/// Clears all `EDGEMAX_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn exporter_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("edgemax-exporter");
    cmd.env("HOME", "/tmp/edgemax-exporter-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/edgemax-exporter-test-nonexistent")
        .env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("EDGEMAX_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    exporter_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Prometheus")
            .and(predicate::str::contains("--address"))
            .and(predicate::str::contains("--listen-address"))
            .and(predicate::str::contains("--insecure")),
    );
}

#[test]
fn test_version_flag() {
    exporter_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("edgemax-exporter"));
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let output = exporter_cmd().arg("--bogus").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_missing_address_exits_with_config_code() {
    let output = exporter_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("address"), "Expected 'address' in output:\n{text}");
}

#[test]
fn test_invalid_namespace_names_the_field() {
    let output = exporter_cmd()
        .args([
            "--address",
            "https://192.168.1.1",
            "--username",
            "ubnt",
            "--password",
            "pw",
            "--namespace",
            "edge-max",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("namespace"), "Expected 'namespace' in output:\n{text}");
}

#[test]
fn test_config_file_supplies_credentials() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "[device]\naddress = \"http://127.0.0.1:1\"\nusername = \"ubnt\"\npassword = \"pw\"\ntimeout = 1\n\n[web]\nlisten_address = \"127.0.0.1:0\""
    )
    .unwrap();

    // Credentials resolve from the file, so the failure is the unreachable
    // device rather than a config error.
    let output = exporter_cmd()
        .arg("--config")
        .arg(file.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(text.contains("Could not log in"), "{text}");
}

// ── Connection errors ───────────────────────────────────────────────

#[test]
fn test_unreachable_device_exits_with_connection_code() {
    let output = exporter_cmd()
        .args([
            "--address",
            "http://127.0.0.1:1",
            "--username",
            "ubnt",
            "--password",
            "pw",
            "--timeout",
            "1",
            "--listen-address",
            "127.0.0.1:0",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[test]
fn test_missing_ca_cert_is_config_error() {
    let output = exporter_cmd()
        .args([
            "--address",
            "https://127.0.0.1:1",
            "--username",
            "ubnt",
            "--password",
            "pw",
            "--ca-cert",
            "/nonexistent/edgemax-ca.pem",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("TLS"));
}
