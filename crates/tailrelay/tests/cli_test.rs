//! Integration tests for the `tailrelay` CLI binary.
//!
//! Parsing, help, completions and config commands run without a backend;
//! the rest talk to a wiremock server standing in for the web UI.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `tailrelay` binary with env isolation.
///
/// Clears all `TAILRELAY_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn tailrelay_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("tailrelay");
    cmd.env("HOME", "/tmp/tailrelay-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/tailrelay-cli-test-nonexistent")
        .env_remove("TAILRELAY_PROFILE")
        .env_remove("TAILRELAY_URL")
        .env_remove("TAILRELAY_OUTPUT")
        .env_remove("TAILRELAY_INSECURE")
        .env_remove("TAILRELAY_TIMEOUT")
        .env_remove("TAILRELAY_SESSION_COOKIE")
        .env("NO_COLOR", "1");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/socat/relays"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "relay": {
                "id": "r1", "listen_port": 9000, "target_host": "10.0.0.5",
                "target_port": 22, "autostart": false, "enabled": true
            },
            "running": true
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/caddy/proxies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "p1", "hostname": "box.tailnet.ts.net", "port": 8443,
            "target": "http://localhost:3000", "trusted_proxies": false,
            "autostart": false, "enabled": true, "running": true
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tailscale/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "MagicDNSName": "box.tailnet.ts.net." })),
        )
        .mount(&server)
        .await;
    server
}

/// Run the binary off the async runtime so wiremock keeps serving.
async fn run(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || tailrelay_cmd().args(args).output().unwrap())
        .await
        .unwrap()
}

fn with_url(server: &MockServer, args: &[&str]) -> Vec<String> {
    let mut out = vec!["--url".to_owned(), server.uri()];
    out.extend(args.iter().map(|a| (*a).to_owned()));
    out
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = tailrelay_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    tailrelay_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("relay")
            .and(predicate::str::contains("proxy"))
            .and(predicate::str::contains("logs"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_completions_zsh() {
    tailrelay_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_config_path_and_show_without_file() {
    tailrelay_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
    tailrelay_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_list_without_url_points_at_config() {
    tailrelay_cmd()
        .arg("list")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config init").or(predicate::str::contains("--url")));
}

#[test]
fn test_out_of_range_port_rejected_by_parser() {
    tailrelay_cmd()
        .args(["relay", "create", "--listen-port", "70000"])
        .assert()
        .failure();
}

#[test]
fn test_delete_without_tty_requires_yes() {
    tailrelay_cmd()
        .args(["--url", "http://127.0.0.1:9", "relay", "delete", "r1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

// ── Against a backend ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_list_plain_prints_ids() {
    let server = backend().await;
    let output = run(with_url(&server, &["--output", "plain", "list"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "r1\np1\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_list_relays_only_as_json() {
    let server = backend().await;
    let output = run(with_url(&server, &["-o", "json-compact", "list", "--relays"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["kind"], "relay");
    assert_eq!(items[0]["record"]["listen_port"], 9000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reserved_proxy_port_fails_before_sending() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/api/caddy/create"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = run(with_url(
        &server,
        &["proxy", "create", "--target", "http://localhost:3000", "--port", "443"],
    ))
    .await;
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("reserved"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delete_missing_relay_exits_not_found() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/api/socat/delete"))
        .and(query_param("id", "r1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let output = run(with_url(&server, &["--yes", "relay", "delete", "r1"])).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Request failed: 404"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_logs_prints_snapshot() {
    let server = backend().await;
    Mock::given(method("GET"))
        .and(path("/api/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": [{
                "timestamp": "2024-05-01T12:00:00Z", "level": "INFO",
                "source": "socat", "message": "relay r1 started"
            }],
            "level": "INFO"
        })))
        .mount(&server)
        .await;

    let output = run(with_url(&server, &["logs"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("[INFO] [socat] relay r1 started")
    );
}
