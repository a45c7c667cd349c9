use assert_cmd::Command;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, NamedTempFile, TempDir};
use tokio::net::TcpListener;

const DEV_BODY: &str = "A new nrf manifest version available.\nPlease run ```git pull``` and ```west update``` in your ```ncs-itl/nrf``` folder, on the ```master``` branch.\n\nCommit message:\nBump manifest to v2.3\n\nUpdated board overlay.";
const PLAIN_BODY: &str = "A new nrf manifest version available.\nPlease run ```git pull``` and ```west update``` in your ```ncs-itl/nrf``` folder";

#[derive(Clone, Default)]
struct Backend {
    token_requests: Arc<Mutex<usize>>,
    messages: Arc<Mutex<Vec<Value>>>,
}

async fn token(State(backend): State<Backend>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    *backend.token_requests.lock().unwrap() += 1;
    let expected = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode("ci-id:ci-secret")
    );
    if headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(expected.as_str()) {
        (
            StatusCode::OK,
            Json(serde_json::json!({"access_token": "t0k3n", "expires_in": 600})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "invalid_client"})),
        )
    }
}

async fn send_message(State(backend): State<Backend>, Json(body): Json<Value>) -> StatusCode {
    backend.messages.lock().unwrap().push(body);
    StatusCode::OK
}

async fn start_backend() -> (Backend, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let backend = Backend::default();
    let app = Router::new()
        .route("/oauth/token", post(token))
        .route("/api/http/chats/messages/send-message", post(send_message))
        .with_state(backend.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (backend, format!("http://{addr}"))
}

/// Directory holding a fake `git` that runs `body`.
fn fake_git(body: &str) -> TempDir {
    let bin_dir = tempdir().unwrap();
    let bin_path = bin_dir.path().join("git");
    let mut script = fs::File::create(&bin_path).unwrap();
    writeln!(script, "#!/usr/bin/env bash").unwrap();
    writeln!(script, "{body}").unwrap();
    drop(script);
    let mut perms = fs::metadata(&bin_path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&bin_path, perms).unwrap();
    bin_dir
}

fn config_file(server_url: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), format!("server_url = \"{server_url}\"\n")).unwrap();
    file
}

fn notifier(bin: &str, git_dir: &Path, workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin(bin).unwrap();
    cmd.current_dir(workdir)
        .env(
            "PATH",
            format!("{}:{}", git_dir.display(), std::env::var("PATH").unwrap_or_default()),
        )
        .env_remove("RUST_LOG")
        .env("SPACE_CLIENT_ID", "ci-id")
        .env("SPACE_CLIENT_SECRET", "ci-secret");
    cmd
}

#[tokio::test(flavor = "multi_thread")]
async fn dev_channel_posts_commit_message() {
    let (backend, url) = start_backend().await;
    let git = fake_git("printf 'Bump manifest to v2.3\\n\\nUpdated board overlay.\\n\\n'");
    let cfg = config_file(&url);
    let workdir = tempdir().unwrap();

    let mut cmd = notifier("send-manifest-dev-message", git.path(), workdir.path());
    cmd.arg("--config").arg(cfg.path());
    tokio::task::spawn_blocking(move || {
        cmd.assert().success().stdout(predicate::str::is_empty());
    })
    .await
    .unwrap();

    let messages = backend.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["channel"], "id:3RHRvU3bsWEy");
    assert_eq!(messages[0]["content"]["text"], DEV_BODY);
}

#[tokio::test(flavor = "multi_thread")]
async fn plain_posts_fixed_text_without_git() {
    let (backend, url) = start_backend().await;
    let workdir = tempdir().unwrap();
    let marker = workdir.path().join("git-was-called");
    let git = fake_git(&format!("touch '{}'\nexit 1", marker.display()));
    let cfg = config_file(&url);

    let mut cmd = notifier("send-manifest-message", git.path(), workdir.path());
    cmd.arg("--config").arg(cfg.path());
    tokio::task::spawn_blocking(move || {
        cmd.assert().success();
    })
    .await
    .unwrap();

    assert!(!marker.exists());
    let messages = backend.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["channel"], "id:3RHRvU3bsWEy");
    assert_eq!(messages[0]["content"]["text"], PLAIN_BODY);
}

#[tokio::test(flavor = "multi_thread")]
async fn git_failure_exits_non_zero_without_network() {
    let (backend, url) = start_backend().await;
    let git = fake_git(
        "echo 'fatal: not a git repository (or any of the parent directories): .git' >&2\nexit 128",
    );
    let cfg = config_file(&url);
    let workdir = tempdir().unwrap();

    let mut cmd = notifier("send-manifest-dev-message", git.path(), workdir.path());
    cmd.arg("--config").arg(cfg.path());
    tokio::task::spawn_blocking(move || {
        cmd.assert()
            .failure()
            .stderr(predicate::str::contains("not a git repository"));
    })
    .await
    .unwrap();

    assert_eq!(*backend.token_requests.lock().unwrap(), 0);
    assert!(backend.messages.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_credentials_exit_non_zero_without_send() {
    let (backend, url) = start_backend().await;
    let git = fake_git("printf 'msg\\n'");
    let cfg = config_file(&url);
    let workdir = tempdir().unwrap();

    let mut cmd = notifier("send-manifest-dev-message", git.path(), workdir.path());
    cmd.arg("--config")
        .arg(cfg.path())
        .env("SPACE_CLIENT_SECRET", "wrong");
    tokio::task::spawn_blocking(move || {
        cmd.assert()
            .failure()
            .stderr(predicate::str::contains("Authentication"));
    })
    .await
    .unwrap();

    assert_eq!(*backend.token_requests.lock().unwrap(), 1);
    assert!(backend.messages.lock().unwrap().is_empty());
}

#[test]
fn missing_credentials_fail_before_git() {
    let workdir = tempdir().unwrap();
    let marker = workdir.path().join("git-was-called");
    let git = fake_git(&format!("touch '{}'", marker.display()));

    notifier("send-manifest-dev-message", git.path(), workdir.path())
        .env_remove("SPACE_CLIENT_SECRET")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SPACE_CLIENT_SECRET"));
    assert!(!marker.exists());
}

#[test]
fn dry_run_prints_body() {
    let workdir = tempdir().unwrap();
    let git = fake_git("printf 'Bump manifest to v2.3\\n\\nUpdated board overlay.\\n'");

    notifier("send-manifest-dev-message", git.path(), workdir.path())
        .env_remove("SPACE_CLIENT_ID")
        .env_remove("SPACE_CLIENT_SECRET")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{DEV_BODY}\n")));

    notifier("send-manifest-message", git.path(), workdir.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{PLAIN_BODY}\n")));
}

#[test]
fn version_and_help_name_each_binary() {
    let workdir = tempdir().unwrap();
    let git = fake_git("exit 1");

    for bin in ["send-manifest-dev-message", "send-manifest-message"] {
        notifier(bin, git.path(), workdir.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::starts_with(format!("{bin} ")));
        notifier(bin, git.path(), workdir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Usage: {bin}")));
    }
}
