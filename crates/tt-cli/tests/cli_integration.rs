//! CLI integration tests
//!
//! Tests the ts-term CLI using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;

fn ts_term() -> Command {
    let mut cmd = Command::cargo_bin("ts-term")
        .expect("Failed to locate ts-term binary - ensure it's built before running tests");
    cmd.env_remove("TS_TERM_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    ts_term()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ts-term"))
        .stdout(predicate::str::contains("Tailscale"));
}

#[test]
fn test_cli_version() {
    ts_term()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ts-term"));
}

#[test]
fn test_cli_connect_help() {
    ts_term()
        .args(["connect", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--address-kind"))
        .stdout(predicate::str::contains("--server"));
}

#[test]
fn test_cli_peers_help() {
    ts_term()
        .args(["peers", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--timeout"));
}

#[test]
fn test_cli_invalid_address_kind() {
    ts_term()
        .args(["connect", "--address-kind", "mac"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown address kind"));
}

#[test]
fn test_cli_config_path_honors_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");

    ts_term()
        .args(["config", "path", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_cli_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    ts_term()
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    assert!(path.exists());

    ts_term()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("session_connect_delay_ms = 1000"))
        .stdout(predicate::str::contains("address_kind = \"short\""));
}

#[test]
fn test_cli_config_show_with_env_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("env.toml");
    std::fs::write(&path, "server = \"term.example:8443\"\nsecure = true\n").unwrap();

    ts_term()
        .args(["config", "show"])
        .env("TS_TERM_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("server = \"term.example:8443\""));
}

#[test]
fn test_cli_peers_unreachable_server() {
    // Nothing listens on port 9 of localhost
    ts_term()
        .args(["peers", "--server", "127.0.0.1:9", "--timeout", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch peers"));
}

#[test]
fn test_cli_invalid_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "resize_debounce_ms = \"soon\"\n").unwrap();

    ts_term()
        .args(["peers", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}
