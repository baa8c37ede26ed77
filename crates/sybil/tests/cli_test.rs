//! Integration tests for the `sybil` CLI binary.
//!
//! Argument parsing, completions and exit codes run without a backend;
//! the session and pipeline tests drive a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `sybil` binary with env isolation.
///
/// Clears all `SYBIL_*` env vars and points config and state at `home`
/// so tests never touch the user's real profiles or session.
fn sybil_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("sybil");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("SYBIL_CONFIG", home.join("config.toml"))
        .env("SYBIL_DATA_DIR", home.join("state"))
        .env_remove("SYBIL_PROFILE")
        .env_remove("SYBIL_API_URL")
        .env_remove("SYBIL_OUTPUT")
        .env_remove("SYBIL_INSECURE")
        .env_remove("SYBIL_TIMEOUT")
        .env_remove("SYBIL_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn session_file(home: &Path) -> PathBuf {
    home.join("state").join("session.json")
}

/// Seed a persisted session as a previous `sybil login` would leave it.
fn write_session(home: &Path, token: &str) {
    let file = session_file(home);
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(
        &file,
        serde_json::to_vec(&json!({
            "token": token,
            "user": {"username": "ops", "email": "ops@example.org"}
        }))
        .unwrap(),
    )
    .unwrap();
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn summary(failed: u64) -> serde_json::Value {
    json!({
        "status": {
            "status": "running",
            "is_running": true,
            "circuit_breaker_open": false,
            "consecutive_failures": 0,
            "interval_seconds": 300,
            "last_run_at": "2025-03-01T09:55:00Z",
            "next_scheduled_run": "2025-03-01T10:00:00Z"
        },
        "processing": {
            "processed_transcripts": 412,
            "failed_transcripts": failed,
            "pending_transcripts": 0,
            "total_chunks": 5120,
            "total_entities": 9800,
            "total_relationships": 14002,
            "success_rate_7d": 100.0
        },
        "performance": {
            "avg_processing_time_ms": 5250.0,
            "p95_processing_time_ms": 12000.0,
            "transcripts_per_hour": 6.5
        },
        "data_quality": {
            "avg_entities_per_transcript": 23.8,
            "avg_relationships_per_transcript": 34.0
        },
        "recent_errors_count": 0,
        "last_updated": "2025-03-01T10:00:00Z"
    })
}

async fn mount_dashboard(server: &MockServer, failed: u64) {
    Mock::given(method("GET"))
        .and(path("/admin/otter/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary(failed)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/otter/daily-stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"date": "2025-03-01", "transcripts_processed": 12, "transcripts_failed": 0}
        ])))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = sybil_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    sybil_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("whitelist")
            .and(predicate::str::contains("pipeline"))
            .and(predicate::str::contains("transcripts"))
            .and(predicate::str::contains("login")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    sybil_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sybil"));
}

#[test]
fn test_subcommand_help() {
    let home = tempfile::tempdir().unwrap();
    sybil_cmd(home.path())
        .args(["pipeline", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("retry-failed")
                .and(predicate::str::contains("daily-stats"))
                .and(predicate::str::contains("watch")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    sybil_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    sybil_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    let home = tempfile::tempdir().unwrap();
    sybil_cmd(home.path())
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete"));
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    let output = sybil_cmd(home.path()).arg("frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_output_format() {
    let home = tempfile::tempdir().unwrap();
    let output = sybil_cmd(home.path())
        .args(["--output", "xml", "whitelist", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("xml"), "Expected rejected value in output:\n{text}");
}

#[test]
fn test_pipeline_config_set_requires_pairs() {
    let home = tempfile::tempdir().unwrap();
    let output = sybil_cmd(home.path())
        .args(["pipeline", "config", "set"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_api_url_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let output = sybil_cmd(home.path())
        .args(["--api-url", "not a url", "whoami"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_override() {
    let home = tempfile::tempdir().unwrap();
    sybil_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_without_file() {
    let home = tempfile::tempdir().unwrap();
    sybil_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success();
}

#[test]
fn test_config_show_masks_passwords() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(
        home.path().join("config.toml"),
        "default_profile = \"prod\"\n\n\
         [profiles.prod]\n\
         api_url = \"https://sybil.example.org\"\n\
         username = \"ops\"\n\
         password = \"hunter2\"\n",
    )
    .unwrap();

    sybil_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("sybil.example.org")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

// ── Session ─────────────────────────────────────────────────────────

#[test]
fn test_command_without_session_exits_auth() {
    let home = tempfile::tempdir().unwrap();
    let output = sybil_cmd(home.path())
        .args(["--api-url", "http://127.0.0.1:9", "whitelist", "stats"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(text.contains("Not logged in"), "Expected auth hint:\n{text}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_login_persists_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "user": {"username": "ops"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    sybil_cmd(home.path())
        .args(["--api-url", &server.uri()])
        .args(["login", "--username", "ops", "--password", "pw"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Logged in as ops"));

    let stored: serde_json::Value =
        serde_json::from_slice(&std::fs::read(session_file(home.path())).unwrap()).unwrap();
    assert_eq!(stored["token"], "fresh-token");
    assert_eq!(stored["user"]["username"], "ops");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejected_login_exits_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let output = sybil_cmd(home.path())
        .args(["--api-url", &server.uri()])
        .args(["login", "--username", "ops", "--password", "wrong"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Invalid credentials"));
    assert!(!session_file(home.path()).exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stored_session_authorizes_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/whitelist/stats"))
        .and(header("authorization", "Bearer stored-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"total": 5, "active": 4, "inactive": 1})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "stored-token");

    let output = sybil_cmd(home.path())
        .args(["--api-url", &server.uri(), "-o", "json-compact"])
        .args(["whitelist", "stats"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats, json!({"total": 5, "active": 4, "inactive": 1}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_expired_session_is_cleared() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/whitelist/stats"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "stale-token");

    let output = sybil_cmd(home.path())
        .args(["--api-url", &server.uri(), "whitelist", "stats"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Session expired"));
    assert!(!session_file(home.path()).exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_logout_removes_session() {
    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "stored-token");

    sybil_cmd(home.path())
        .args(["--api-url", "http://127.0.0.1:9", "logout"])
        .assert()
        .success();
    assert!(!session_file(home.path()).exists());
}

// ── Backend errors ──────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_not_found_maps_to_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/gdrive/files/missing/retry"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "File not found"})))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "stored-token");

    let output = sybil_cmd(home.path())
        .args(["--api-url", &server.uri(), "gdrive", "retry", "missing"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("File not found"));
}

// ── Pipeline controls ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unavailable_control_needs_force() {
    let server = MockServer::start().await;
    mount_dashboard(&server, 0).await;
    Mock::given(method("POST"))
        .and(path("/admin/otter/retry-failed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Retrying 0"})))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "stored-token");

    let output = sybil_cmd(home.path())
        .args(["--api-url", &server.uri(), "pipeline", "retry-failed"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("no failed transcripts"));

    sybil_cmd(home.path())
        .args(["--api-url", &server.uri(), "pipeline", "retry-failed", "--force"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Retrying 0"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_trigger_reports_backend_message() {
    let server = MockServer::start().await;
    mount_dashboard(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/admin/otter/trigger"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Pipeline triggered"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "stored-token");

    sybil_cmd(home.path())
        .args(["--api-url", &server.uri(), "pipeline", "trigger"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Pipeline triggered"));
}

#[test]
fn test_control_against_unreachable_backend_exits_connection() {
    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "stored-token");

    let output = sybil_cmd(home.path())
        .args(["--api-url", "http://127.0.0.1:9", "pipeline", "start"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_forbidden_dashboard_keeps_permission_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/otter/summary"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Admins only"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/otter/daily-stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "stored-token");

    let output = sybil_cmd(home.path())
        .args(["--api-url", &server.uri(), "pipeline", "stop"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
    assert!(combined_output(&output).contains("Admins only"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blank_whitelist_phone_is_a_usage_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/whitelist"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "stored-token");

    let output = sybil_cmd(home.path())
        .args(["--api-url", &server.uri(), "whitelist", "add", "   "])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("phone number cannot be blank"));
}
