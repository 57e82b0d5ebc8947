use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn brainlex_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_brainlex"))
}

fn write_config(content: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_dir = tmp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("brainlex.toml");
    fs::write(&config_path, content).unwrap();
    (tmp, config_path)
}

fn run_brainlex(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = brainlex_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run brainlex binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// A local port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn test_help_lists_commands() {
    let (_tmp, config_path) = write_config("");
    let (stdout, _, success) = run_brainlex(&config_path, &["--help"]);
    assert!(success);
    for cmd in ["serve", "check", "init"] {
        assert!(stdout.contains(cmd), "help should mention {cmd}: {stdout}");
    }
}

#[test]
fn test_invalid_config_rejected() {
    let (_tmp, config_path) = write_config("[db]\nmax_connections = 0\n");
    let (_, stderr, success) = run_brainlex(&config_path, &["serve"]);
    assert!(!success);
    assert!(
        stderr.contains("max_connections"),
        "Should name the bad key, got: {}",
        stderr
    );
}

#[test]
fn test_check_requires_credentials() {
    let (_tmp, config_path) = write_config("");
    let (_, stderr, success) = run_brainlex(&config_path, &["check", "--host", "localhost"]);
    assert!(!success);
    assert!(stderr.contains("--username"), "got: {}", stderr);
}

#[test]
fn test_check_unreachable_database_fails() {
    let (_tmp, config_path) = write_config("[db]\nconnect_timeout_secs = 1\n");
    let port = closed_port().to_string();
    let (stdout, stderr, success) = run_brainlex(
        &config_path,
        &[
            "check",
            "--host",
            "127.0.0.1",
            "--port",
            &port,
            "--username",
            "reader",
            "--password",
            "not-a-real-secret",
            "--database",
            "atlas",
        ],
    );
    assert!(!success);
    assert!(!stdout.contains("connected:"));
    assert!(!stderr.contains("not-a-real-secret"));
}
