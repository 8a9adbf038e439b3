//! End-to-end CLI tests for the rget binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

/// Command with an isolated config location so a developer's config file
/// never leaks into the test.
fn rget(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rget").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_without_urls_returns_zero() {
    let config_home = TempDir::new().unwrap();
    rget(&config_home).assert().success();
}

#[test]
fn test_binary_help_displays_usage() {
    let config_home = TempDir::new().unwrap();
    rget(&config_home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resumable, throttled HTTP downloads"))
        .stdout(predicate::str::contains("--header"));
}

#[test]
fn test_binary_version_displays_version() {
    let config_home = TempDir::new().unwrap();
    rget(&config_home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rget"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let config_home = TempDir::new().unwrap();
    rget(&config_home)
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_invalid_url_fails() {
    let config_home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    rget(&config_home)
        .args(["--no-progress", "-o"])
        .arg(out.path())
        .arg("ftp://example.com/file.iso")
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 1 downloads failed"));
}

#[test]
fn test_binary_rejects_bad_config_file() {
    let config_home = TempDir::new().unwrap();
    std::fs::create_dir_all(config_home.path().join("rget")).unwrap();
    std::fs::write(
        config_home.path().join("rget").join("config.toml"),
        "connect_timeout_secs = 0\n",
    )
    .unwrap();

    rget(&config_home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config.toml"));
}

#[tokio::test]
async fn test_binary_downloads_into_output_dir() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/hello.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello from rget".to_vec()))
        .mount(&mock_server)
        .await;

    let config_home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let url = format!("{}/hello.txt#limit=500", mock_server.uri());

    let mut cmd = rget(&config_home);
    cmd.args(["--no-progress", "-o"]).arg(out.path()).arg(&url);
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();
    assert.success();

    assert_eq!(
        std::fs::read(out.path().join("hello.txt")).unwrap(),
        b"hello from rget"
    );
}

#[tokio::test]
async fn test_binary_reports_http_failure() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let config_home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let url = format!("{}/gone", mock_server.uri());

    let mut cmd = rget(&config_home);
    cmd.args(["--no-progress", "-o"]).arg(out.path()).arg(&url);
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();
    assert
        .failure()
        .stderr(predicate::str::contains("410"));
}
