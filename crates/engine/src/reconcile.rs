use std::collections::{BTreeMap, BTreeSet};

use crate::extract::{extract_issue_keys, unique_issue_keys};
use crate::model::{
    Assignment, BranchInfo, Commit, CommitCount, CommitStatus, HygieneOutcome, HygieneReport,
    HygieneSummary, IssueKey, KeyClassification, KeyVerification, LogEntry, RemoteIssue,
    TrackerStatus, ViewerIdentity, DETACHED_BRANCH,
};
use crate::tracker::IssueTracker;
use crate::vcs::VcsReader;

/// Reconciles local git metadata with the issue tracker.
///
/// Stateless: every [`HygieneEngine::check_hygiene`] call re-reads git and the tracker.
pub struct HygieneEngine<V, T> {
    vcs: V,
    tracker: T,
}

struct Resolution {
    status: TrackerStatus,
    issues: BTreeMap<IssueKey, RemoteIssue>,
    viewer: Option<ViewerIdentity>,
}

impl<V: VcsReader, T: IssueTracker> HygieneEngine<V, T> {
    pub fn new(vcs: V, tracker: T) -> Self {
        Self { vcs, tracker }
    }

    pub async fn check_hygiene(&self, count: CommitCount) -> HygieneOutcome {
        let branch_name = match self.vcs.current_branch().await {
            Ok(name) => name,
            Err(err) => {
                log::info!("hygiene check aborted: {err}");
                return HygieneOutcome::NotARepository {
                    message: err.to_string(),
                };
            }
        };
        let branch = branch_info(branch_name);

        let entries = match self.vcs.recent_commits(count).await {
            Ok(entries) => entries,
            Err(err) => {
                log::info!("hygiene check aborted: {err}");
                return HygieneOutcome::NotARepository {
                    message: err.to_string(),
                };
            }
        };
        if entries.is_empty() {
            return HygieneOutcome::EmptyHistory { branch };
        }

        let commits: Vec<Commit> = entries.into_iter().map(commit_from_entry).collect();
        let requested = unique_issue_keys(
            branch
                .issue_keys
                .iter()
                .chain(commits.iter().flat_map(|c| c.issue_keys.iter())),
        );
        log::debug!(
            "branch={} commits={} distinct_keys={}",
            branch.name,
            commits.len(),
            requested.len()
        );

        let resolution = self.resolve(&requested).await;
        let keys = classify_keys(&requested, &branch, &commits, &resolution);
        let summary = summarize(&commits, &keys);

        HygieneOutcome::Checked(HygieneReport {
            branch,
            commits,
            issues: resolution.issues,
            viewer: resolution.viewer,
            keys,
            tracker: resolution.status,
            summary,
        })
    }

    async fn resolve(&self, requested: &BTreeSet<IssueKey>) -> Resolution {
        let skipped = |status| Resolution {
            status,
            issues: BTreeMap::new(),
            viewer: None,
        };
        if !self.tracker.is_configured() {
            return skipped(TrackerStatus::Disabled);
        }
        if requested.is_empty() {
            return skipped(TrackerStatus::NotNeeded);
        }

        let (viewer, issues) = tokio::join!(
            self.tracker.resolve_viewer(),
            self.tracker.resolve_issues(requested)
        );

        // Nothing resolved and no viewer: most likely a bad credential. A valid key in a
        // workspace without any of these issues looks identical; we accept that ambiguity.
        if issues.is_empty() && viewer.is_none() {
            log::warn!(
                "tracker returned no data for {} key(s) and no viewer; treating it as unavailable",
                requested.len()
            );
            return skipped(TrackerStatus::Unavailable);
        }

        log::info!(
            "tracker resolved {}/{} key(s)",
            issues.len(),
            requested.len()
        );
        Resolution {
            status: TrackerStatus::Active,
            issues,
            viewer,
        }
    }
}

fn branch_info(name: String) -> BranchInfo {
    let detached = name == DETACHED_BRANCH;
    let issue_keys = if detached {
        Vec::new()
    } else {
        extract_issue_keys(&name)
    };
    BranchInfo {
        name,
        detached,
        issue_keys,
    }
}

fn commit_from_entry(entry: LogEntry) -> Commit {
    let issue_keys = extract_issue_keys(&entry.message);
    let status = if issue_keys.is_empty() {
        CommitStatus::MissingKeys
    } else {
        CommitStatus::HasKeys
    };
    Commit {
        sha: entry.sha,
        message: entry.message,
        issue_keys,
        status,
    }
}

fn assignment(issue: &RemoteIssue, viewer: Option<&ViewerIdentity>) -> Option<Assignment> {
    let viewer = viewer?;
    Some(match issue.assignee_id.as_deref() {
        None => Assignment::Unassigned,
        Some(id) if id == viewer.0 => Assignment::AssignedToCaller,
        Some(_) => Assignment::AssignedToOther,
    })
}

fn classify_keys(
    requested: &BTreeSet<IssueKey>,
    branch: &BranchInfo,
    commits: &[Commit],
    resolution: &Resolution,
) -> Vec<KeyClassification> {
    requested
        .iter()
        .map(|key| {
            let verification = match resolution.issues.get(key) {
                Some(issue) => KeyVerification::Verified {
                    title: issue.title.clone(),
                    state_name: issue.state_name.clone(),
                    assignment: assignment(issue, resolution.viewer.as_ref()),
                },
                None => KeyVerification::Unverifiable,
            };
            KeyClassification {
                key: key.clone(),
                in_branch: branch.issue_keys.contains(key),
                commits: commits
                    .iter()
                    .filter(|c| c.issue_keys.contains(key))
                    .map(|c| c.sha.clone())
                    .collect(),
                verification,
            }
        })
        .collect()
}

fn summarize(commits: &[Commit], keys: &[KeyClassification]) -> HygieneSummary {
    HygieneSummary {
        commits_total: commits.len(),
        commits_missing_keys: commits
            .iter()
            .filter(|c| c.status == CommitStatus::MissingKeys)
            .count(),
        keys_total: keys.len(),
        keys_unverifiable: keys
            .iter()
            .filter(|k| k.verification == KeyVerification::Unverifiable)
            .count(),
    }
}
