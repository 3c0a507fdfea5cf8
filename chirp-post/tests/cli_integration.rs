//! CLI integration tests for chirp-post

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTEXT: &str = r#"{"agent_name": "agent", "topics": ["rust"], "post_directions": "upbeat"}"#;

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

/// Temp dir holding a config that points generation at `model_base`, plus a context file
fn setup_test_env(model_base: &str) -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let context_path = temp_dir.path().join("context.json");

    let config_content = format!(
        r#"
[generation]
provider = "openai"
base_url = "{}/v1"
api_key = "sk-test"

[http]
connect_timeout_secs = 5
request_timeout_secs = 10
"#,
        escape_path_for_toml(model_base)
    );
    fs::write(&config_path, config_content).unwrap();
    fs::write(&context_path, CONTEXT).unwrap();

    (temp_dir, config_path, context_path)
}

/// chirp-post with every setting the environment could leak in removed
fn chirp_post() -> Command {
    let mut cmd = Command::cargo_bin("chirp-post").unwrap();
    for key in [
        "CHIRPCAST_CONFIG",
        "TWITTER_USERNAME",
        "TWITTER_PASSWORD",
        "TWITTER_EMAIL",
        "TWITTER_2FA_SECRET",
        "MAX_TWEET_LENGTH",
        "TWITTER_DRY_RUN",
        "OPENAI_API_KEY",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

async fn model_server(content: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini",
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })))
        .mount(&server)
        .await;
    server
}

#[test]
fn test_help_lists_exit_codes() {
    chirp_post()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("EXIT CODES"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_invalid_context_exits_3() {
    let (_temp_dir, config_path, _) = setup_test_env("http://127.0.0.1:9");

    chirp_post()
        .arg("--config")
        .arg(&config_path)
        .write_stdin("this is not json")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_empty_stdin_exits_3() {
    let (_temp_dir, config_path, _) = setup_test_env("http://127.0.0.1:9");

    chirp_post()
        .arg("--config")
        .arg(&config_path)
        .write_stdin("")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Context is empty"));
}

#[test]
fn test_missing_credentials_exits_2() {
    let (_temp_dir, config_path, context_path) = setup_test_env("http://127.0.0.1:9");

    chirp_post()
        .arg("--config")
        .arg(&config_path)
        .arg("--context")
        .arg(&context_path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("credentials not configured"));
}

#[test]
fn test_invalid_max_length_is_a_config_error() {
    let (_temp_dir, config_path, context_path) = setup_test_env("http://127.0.0.1:9");

    chirp_post()
        .arg("--config")
        .arg(&config_path)
        .arg("--context")
        .arg(&context_path)
        .env("MAX_TWEET_LENGTH", "lots")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("MAX_TWEET_LENGTH"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dry_run_generates_without_posting() {
    let server = model_server(r#"{"text": "Shipping v2 today!"}"#).await;
    let (_temp_dir, config_path, context_path) = setup_test_env(&server.uri());

    chirp_post()
        .arg("--config")
        .arg(&config_path)
        .arg("--context")
        .arg(&context_path)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("dry-run"));

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dry_run_from_environment_with_json_output() {
    let server = model_server(r#"{"text": "Shipping v2 today!"}"#).await;
    let (_temp_dir, config_path, _) = setup_test_env(&server.uri());

    let output = chirp_post()
        .arg("--config")
        .arg(&config_path)
        .arg("--format")
        .arg("json")
        .env("TWITTER_DRY_RUN", "TRUE")
        .write_stdin(CONTEXT)
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["success"], json!(true));
    assert_eq!(parsed["dry_run"], json!(true));
    assert_eq!(
        parsed["result"],
        json!({ "text": null, "model": null, "id": null, "userName": null })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unusable_model_output_exits_1() {
    let server = model_server(r#"{"tweet": "wrong field"}"#).await;
    let (_temp_dir, config_path, context_path) = setup_test_env(&server.uri());

    chirp_post()
        .arg("--config")
        .arg(&config_path)
        .arg("--context")
        .arg(&context_path)
        .arg("--dry-run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not posted"));
}
