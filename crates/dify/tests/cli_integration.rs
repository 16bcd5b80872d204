//! CLI integration tests for the dify command-line interface.
//!
//! Every test points `DIFY_CONFIG_DIR` and the working directory at a fresh
//! temp dir so that no real user configuration is picked up.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get an isolated command for the dify binary.
fn dify(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dify").unwrap();
    cmd.current_dir(home.path())
        .env("DIFY_CONFIG_DIR", home.path())
        .env_remove("DIFY_HOST")
        .env_remove("DIFY_API_KEY")
        .env_remove("DIFY_USER")
        .env_remove("RUST_LOG");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    dify(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("workflow"))
        .stdout(predicate::str::contains("conversations"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    let home = TempDir::new().unwrap();
    dify(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dify"));
}

#[test]
fn test_workflow_help() {
    let home = TempDir::new().unwrap();
    dify(&home)
        .args(["workflow", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("KEY=VALUE"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Validation Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_chat_requires_query() {
    let home = TempDir::new().unwrap();
    dify(&home).arg("chat").assert().failure();
}

#[test]
fn test_malformed_input_rejected() {
    let home = TempDir::new().unwrap();
    dify(&home)
        .args(["workflow", "-i", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key=value"));
}

#[test]
fn test_rename_needs_name_or_auto() {
    let home = TempDir::new().unwrap();
    dify(&home)
        .args(["conversations", "rename", "c1"])
        .assert()
        .failure();
}

#[test]
fn test_missing_api_key_reported() {
    let home = TempDir::new().unwrap();
    dify(&home)
        .args(["chat", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DIFY_API_KEY"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_path_uses_override_dir() {
    let home = TempDir::new().unwrap();
    dify(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("client.toml"));
}

#[test]
fn test_config_init_then_show() {
    let home = TempDir::new().unwrap();
    dify(&home)
        .args([
            "config",
            "init",
            "--host",
            "http://localhost:5001",
            "--api-key",
            "app-1234567890",
        ])
        .assert()
        .success();
    assert!(home.path().join("client.toml").is_file());

    dify(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:5001"))
        .stdout(predicate::str::contains("app-12…"))
        .stdout(predicate::str::contains("1234567890").not());

    dify(&home)
        .args(["config", "init", "--host", "http://other"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

// ─────────────────────────────────────────────────────────────────────────────
// End-to-end Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_chat_prints_streamed_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat-messages"))
        .and(body_partial_json(json!({"query": "hi", "user": "tester"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            concat!(
                "data: {\"event\":\"message\",\"conversation_id\":\"c1\",\"answer\":\"Hel\"}\n\n",
                "data: {\"event\":\"message\",\"conversation_id\":\"c1\",\"answer\":\"lo\"}\n\n",
                "data: {\"event\":\"message_end\",\"conversation_id\":\"c1\"}\n\n",
            ),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    dify(&home)
        .args([
            "--host",
            &server.uri(),
            "--api-key",
            "app-test",
            "--user",
            "tester",
            "chat",
            "hi",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_conversations_list_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/conversations"))
        .and(query_param("user", "tester"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "limit": 20,
            "has_more": false,
            "data": [{"id": "c1", "name": "Greeting"}]
        })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    dify(&home)
        .env("DIFY_API_KEY", "app-test")
        .env("DIFY_HOST", server.uri())
        .env("DIFY_USER", "tester")
        .args(["--json", "conversations", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Greeting\""));
}
