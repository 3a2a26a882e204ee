//! CLI integration tests

use std::path::Path;
use std::process::{Command, Output};

fn cementctl(config_dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_cementctl"));
    command
        .env("CEMENTCTL_CONFIG", config_dir.join("config.json"))
        .env_remove("CEMENTCTL_API_URL")
        .env("NO_COLOR", "1");
    command
}

fn run(config_dir: &Path, args: &[&str]) -> Output {
    cementctl(config_dir)
        .args(args)
        .output()
        .expect("Failed to execute cementctl")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["--help"]);
    let stdout = stdout(&output);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("CementAI plant optimizer"),
        "Should show app name"
    );
    for command in ["status", "plant", "predict", "models", "knowledge", "chat", "config"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["--version"]);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout(&output).contains("cementctl 2.0.0"));
}

#[test]
fn test_predict_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["predict", "--help"]);
    let stdout = stdout(&output);

    assert!(output.status.success());
    assert!(stdout.contains("--file"), "Should show file option");
    assert!(stdout.contains("--set"), "Should show set option");
}

#[test]
fn test_knowledge_refresh_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["knowledge", "refresh", "--help"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("--table"));
}

#[test]
fn test_models_json_output() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/models/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"models_count": 8, "models": ["energy_regressor"], "all_ready": false, "note": "BigQuery client not initialized"}"#,
        )
        .create();

    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &["--api-url", &server.url(), "--format", "json", "models"],
    );

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let body: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(body["note"], "BigQuery client not initialized");
    assert_eq!(body["all_ready"], false);
    mock.assert();
}

#[test]
fn test_predict_sends_overrides() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/predict-comprehensive")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "tsr_pct": 55.0,
            "feed_rate_tph": 850.0
        })))
        .with_status(500)
        .with_body(r#"{"detail": "Prediction failed: model energy_regressor unavailable"}"#)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &["--api-url", &server.url(), "predict", "--set", "tsr_pct=55"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("API error (500"));
    assert!(stderr.contains("Prediction failed"));
    mock.assert();
}

#[test]
fn test_predict_rejects_unknown_metric() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &["--api-url", "http://127.0.0.1:9", "predict", "--set", "kiln_speed=3"],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown metric 'kiln_speed'"));
}

#[test]
fn test_knowledge_refresh_error_exits_nonzero() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/knowledge/refresh")
        .match_body(mockito::Matcher::Json(serde_json::json!({"table": "kiln_rag"})))
        .with_status(500)
        .with_body(
            r#"{"status": "ERROR", "error": "warehouse client not initialized: no token", "timestamp": "2025-01-01T00:00:00Z"}"#,
        )
        .create();

    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &["--api-url", &server.url(), "knowledge", "refresh", "--table", "kiln_rag"],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Knowledge refresh failed"));
}

#[test]
fn test_config_set_is_used_for_later_calls() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body(r#"{"response": "I can help you with energy optimization.", "source": "fallback"}"#)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &["config", "set", "--api-url", &server.url(), "--format", "json"],
    );
    assert!(output.status.success());
    assert!(dir.path().join("config.json").exists());

    let output = run(dir.path(), &["chat", "hello"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let body: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(body["source"], "fallback");
    mock.assert();
}
