#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const GOOD_KEY: &str = "lin_api_good";
pub const VIEWER_ID: &str = "user-1";

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

pub fn run_git(root: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .current_dir(root)
        .args(["-c", "commit.gpgsign=false", "-c", "core.hooksPath=/dev/null"])
        .args(args)
        .env("GIT_AUTHOR_NAME", "hygiene-tests")
        .env("GIT_AUTHOR_EMAIL", "tests@example.invalid")
        .env("GIT_COMMITTER_NAME", "hygiene-tests")
        .env("GIT_COMMITTER_EMAIL", "tests@example.invalid")
        .output()
        .with_context(|| format!("run git {args:?}"))?;
    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "git {args:?} failed (status={:?})\nstdout:\n{stdout}\nstderr:\n{stderr}",
            output.status.code()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Fresh repository whose unborn branch is `branch`.
pub fn init_repo(root: &Path, branch: &str) -> Result<()> {
    run_git(root, &["init", "-q"])?;
    run_git(root, &["symbolic-ref", "HEAD", &format!("refs/heads/{branch}")])?;
    Ok(())
}

/// Commit in order; the last message ends up as the newest commit.
pub fn commit_all(root: &Path, messages: &[&str]) -> Result<()> {
    for message in messages {
        run_git(root, &["commit", "-q", "--allow-empty", "-m", message])?;
    }
    Ok(())
}

#[derive(Clone, Copy)]
pub struct FakeIssue {
    pub title: &'static str,
    pub state: &'static str,
    pub assignee: Option<&'static str>,
}

/// In-process stand-in for the Linear GraphQL endpoint.
///
/// Team `BAD` answers 500, team `SLOW` stalls for two seconds; everything else is looked up
/// in `issues` by identifier.
pub struct FakeLinear {
    pub issues: HashMap<String, FakeIssue>,
    pub requests: AtomicUsize,
}

impl FakeLinear {
    pub fn new(issues: &[(&str, FakeIssue)]) -> Arc<Self> {
        Arc::new(Self {
            issues: issues
                .iter()
                .map(|(key, issue)| (key.to_string(), *issue))
                .collect(),
            requests: AtomicUsize::new(0),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

async fn graphql(
    State(fake): State<Arc<FakeLinear>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.requests.fetch_add(1, Ordering::SeqCst);

    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == GOOD_KEY);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "errors": [ { "message": "Authentication required" } ] })),
        );
    }

    let query = body["query"].as_str().unwrap_or_default();
    if query.contains("viewer") {
        return (
            StatusCode::OK,
            Json(json!({ "data": { "viewer": { "id": VIEWER_ID } } })),
        );
    }

    let filter = &body["variables"]["filter"];
    let team = filter["team"]["key"]["eq"].as_str().unwrap_or_default();
    let number = filter["number"]["eq"].as_u64().unwrap_or_default();
    match team {
        "BAD" => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "errors": [ { "message": "boom" } ] })),
            )
        }
        "SLOW" => tokio::time::sleep(Duration::from_secs(2)).await,
        _ => {}
    }

    let identifier = format!("{team}-{number}");
    let nodes = match fake.issues.get(&identifier) {
        Some(issue) => vec![json!({
            "identifier": identifier,
            "title": issue.title,
            "state": { "name": issue.state },
            "assignee": issue.assignee.map(|id| json!({ "id": id })),
        })],
        None => Vec::new(),
    };
    (
        StatusCode::OK,
        Json(json!({ "data": { "issues": { "nodes": nodes } } })),
    )
}

/// Serve `fake` on an ephemeral port and return the GraphQL URL.
pub async fn serve_fake_linear(fake: Arc<FakeLinear>) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind fake linear")?;
    let addr = listener.local_addr().context("fake linear addr")?;
    let app = Router::new().route("/graphql", post(graphql)).with_state(fake);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/graphql"))
}
