use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::error::{HygieneError, Result};
use crate::model::{CommitCount, LogEntry, DETACHED_BRANCH};

/// Read-only access to the version-control metadata the reconciler needs.
#[async_trait]
pub trait VcsReader: Send + Sync {
    /// Current branch name, or [`DETACHED_BRANCH`] when HEAD is detached.
    async fn current_branch(&self) -> Result<String>;

    /// Up to `count` most recent commits, newest first. Empty when the branch has no commits.
    async fn recent_commits(&self, count: CommitCount) -> Result<Vec<LogEntry>>;
}

/// [`VcsReader`] backed by the `git` binary.
#[derive(Debug, Clone)]
pub struct GitReader {
    root: PathBuf,
    timeout: Duration,
}

struct GitOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

impl GitReader {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn run(&self, args: &[&str]) -> Result<GitOutput> {
        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(&self.root)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .env("LANGUAGE", "C")
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return Err(HygieneError::NotAVcsRepository(format!(
                    "failed to run git: {err}"
                )))
            }
            Err(_) => {
                return Err(HygieneError::NotAVcsRepository(format!(
                    "git {} timed out after {}ms",
                    args.first().copied().unwrap_or_default(),
                    self.timeout.as_millis()
                )))
            }
        };

        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

fn failure_detail(subcommand: &str, stderr: &str) -> String {
    if stderr.is_empty() {
        format!("git {subcommand} failed")
    } else {
        stderr.to_string()
    }
}

fn is_unborn_branch_error(stderr: &str) -> bool {
    stderr.contains("does not have any commits yet")
}

pub(crate) fn branch_or_detached(raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() {
        DETACHED_BRANCH.to_string()
    } else {
        name.to_string()
    }
}

/// Parse `git log --oneline` output into `(sha, subject)` pairs.
pub(crate) fn parse_oneline_log(raw: &str) -> Vec<LogEntry> {
    raw.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once(' ') {
            Some((sha, message)) => LogEntry {
                sha: sha.to_string(),
                message: message.to_string(),
            },
            None => LogEntry {
                sha: line.to_string(),
                message: String::new(),
            },
        })
        .collect()
}

#[async_trait]
impl VcsReader for GitReader {
    async fn current_branch(&self) -> Result<String> {
        let out = self.run(&["branch", "--show-current"]).await?;
        if !out.success {
            return Err(HygieneError::NotAVcsRepository(failure_detail(
                "branch",
                &out.stderr,
            )));
        }
        Ok(branch_or_detached(&out.stdout))
    }

    async fn recent_commits(&self, count: CommitCount) -> Result<Vec<LogEntry>> {
        let limit = format!("-n{}", count.get());
        let out = self
            .run(&["log", &limit, "--oneline", "--no-color", "--no-decorate"])
            .await?;
        if !out.success {
            if is_unborn_branch_error(&out.stderr) {
                log::debug!("git log: branch has no commits yet");
                return Ok(Vec::new());
            }
            return Err(HygieneError::NotAVcsRepository(failure_detail(
                "log",
                &out.stderr,
            )));
        }
        Ok(parse_oneline_log(&out.stdout))
    }
}
