use hygiene_engine::{
    Assignment, BranchInfo, CommitStatus, HygieneOutcome, HygieneReport, KeyVerification,
    TrackerStatus,
};
use rmcp::model::{CallToolResult, Content};

use super::error::{attach_structured_content, tool_error_envelope, ErrorEnvelope};
use super::report_doc::ReportDocBuilder;

const TOOL: &str = "check_commit_hygiene";

/// Turn an outcome into the tool result: markdown text plus the outcome as structured content.
pub(crate) fn outcome_result(outcome: &HygieneOutcome) -> CallToolResult {
    match outcome {
        HygieneOutcome::NotARepository { message } => tool_error_envelope(ErrorEnvelope {
            code: "not_a_repository".to_string(),
            message: "This directory is not a git repository or git is not installed."
                .to_string(),
            details: Some(message.clone()),
            hint: Some("Please run this from a git-initialized project.".to_string()),
        }),
        HygieneOutcome::EmptyHistory { branch } => {
            success_with_outcome(render_empty_history(branch), outcome)
        }
        HygieneOutcome::Checked(report) => success_with_outcome(render_report(report), outcome),
    }
}

fn success_with_outcome(text: String, outcome: &HygieneOutcome) -> CallToolResult {
    attach_structured_content(
        CallToolResult::success(vec![Content::text(text)]),
        outcome,
        TOOL,
    )
}

pub(crate) fn render_empty_history(branch: &BranchInfo) -> String {
    let mut doc = ReportDocBuilder::new();
    render_branch(&mut doc, branch);
    doc.push_blank();
    doc.push_line("⚠️ No commits found in this repository yet.");
    doc.finish()
}

fn render_branch(doc: &mut ReportDocBuilder, branch: &BranchInfo) {
    doc.push_field("Current branch", &format!("`{}`", branch.name));
    if branch.detached {
        doc.push_item("⚠️ HEAD is detached, so there is no branch name to link to an issue.");
        return;
    }
    if branch.issue_keys.is_empty() {
        doc.push_item(&format!(
            "⚠️ No issue key found in branch name. Work is linked to issues through keys in \
             branch names (e.g. `ENG-123-fix-auth`). Consider renaming: \
             `git branch -m <ENG-XXX>-{}`",
            branch.name
        ));
    } else {
        doc.push_item(&format!(
            "✅ Issue key(s) found in branch name: {}",
            join_keys(branch.issue_keys.iter().map(|k| k.as_str()))
        ));
    }
}

pub(crate) fn render_report(report: &HygieneReport) -> String {
    let mut doc = ReportDocBuilder::new();
    render_branch(&mut doc, &report.branch);

    doc.push_blank();
    doc.push_heading(&format!("Last {} commits", report.commits.len()));
    for commit in &report.commits {
        let (marker, keys) = match commit.status {
            CommitStatus::HasKeys => (
                "✅",
                join_keys(commit.issue_keys.iter().map(|k| k.as_str())),
            ),
            CommitStatus::MissingKeys => ("⚠️", "no issue key".to_string()),
        };
        doc.push_item(&format!(
            "{marker} `{}` {} [{keys}]",
            commit.sha, commit.message
        ));
    }

    render_tracker(&mut doc, report);

    doc.push_blank();
    let summary = &report.summary;
    if summary.commits_missing_keys > 0 {
        doc.push_field(
            "Summary",
            &format!(
                "{}/{} commits are missing issue keys. These commits can't be linked to tracked work.",
                summary.commits_missing_keys, summary.commits_total
            ),
        );
    } else {
        doc.push_field(
            "Summary",
            &format!("All {} commits have issue keys. ✅", summary.commits_total),
        );
    }
    doc.finish()
}

fn render_tracker(doc: &mut ReportDocBuilder, report: &HygieneReport) {
    match report.tracker {
        TrackerStatus::NotNeeded => {}
        TrackerStatus::Disabled => {
            if !report.keys.is_empty() {
                doc.push_blank();
                doc.push_note(
                    "Issue keys match the expected pattern. Set LINEAR_API_KEY (environment or .env) \
                     to verify issue status directly against Linear.",
                );
            }
        }
        TrackerStatus::Unavailable => {
            doc.push_blank();
            doc.push_line(
                "⚠️ LINEAR_API_KEY is set but the Linear API returned no data. The key may be \
                 invalid. Falling back to pattern-only validation.",
            );
        }
        TrackerStatus::Active => {
            doc.push_blank();
            doc.push_heading("Linear issue verification");
            let mut unverifiable = Vec::new();
            for entry in &report.keys {
                match &entry.verification {
                    KeyVerification::Verified {
                        title,
                        state_name,
                        assignment,
                    } => {
                        let suffix = match assignment {
                            Some(Assignment::AssignedToCaller) => " (assigned to you ✅)",
                            Some(Assignment::AssignedToOther) => " (⚠️ assigned to someone else)",
                            Some(Assignment::Unassigned) => " (unassigned)",
                            None => "",
                        };
                        doc.push_item(&format!(
                            "• **{}**: {title}, *{state_name}*{suffix}",
                            entry.key
                        ));
                    }
                    KeyVerification::Unverifiable => unverifiable.push(entry.key.as_str()),
                }
            }
            if !unverifiable.is_empty() {
                doc.push_blank();
                doc.push_item(&format!(
                    "⚠️ Could not verify: {}. These may belong to a different team or workspace.",
                    join_keys(unverifiable.into_iter())
                ));
            }
        }
    }
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a str>) -> String {
    keys.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hygiene_engine::{
        extract_issue_keys, Commit, HygieneSummary, IssueKey, KeyClassification, RemoteIssue,
        ViewerIdentity,
    };
    use std::collections::BTreeMap;

    fn result_text(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .expect("text content")
    }

    fn key(raw: &str) -> IssueKey {
        extract_issue_keys(raw).remove(0)
    }

    fn commit(sha: &str, message: &str) -> Commit {
        let issue_keys = extract_issue_keys(message);
        let status = if issue_keys.is_empty() {
            CommitStatus::MissingKeys
        } else {
            CommitStatus::HasKeys
        };
        Commit {
            sha: sha.to_string(),
            message: message.to_string(),
            issue_keys,
            status,
        }
    }

    fn sample_report(tracker: TrackerStatus, keys: Vec<KeyClassification>) -> HygieneReport {
        let commits = vec![commit("a1b2c3", "ENG-12 fix bug"), commit("d4e5f6", "cleanup")];
        HygieneReport {
            branch: BranchInfo {
                name: "ENG-12-fix-bug".to_string(),
                detached: false,
                issue_keys: vec![key("ENG-12")],
            },
            summary: HygieneSummary {
                commits_total: 2,
                commits_missing_keys: 1,
                keys_total: keys.len(),
                keys_unverifiable: keys
                    .iter()
                    .filter(|k| k.verification == KeyVerification::Unverifiable)
                    .count(),
            },
            commits,
            issues: BTreeMap::new(),
            viewer: None,
            keys,
            tracker,
        }
    }

    fn unverifiable(raw: &str) -> KeyClassification {
        KeyClassification {
            key: key(raw),
            in_branch: false,
            commits: Vec::new(),
            verification: KeyVerification::Unverifiable,
        }
    }

    #[test]
    fn regex_only_report_mentions_missing_keys_and_setup_hint() {
        let report = sample_report(TrackerStatus::Disabled, vec![unverifiable("ENG-12")]);
        let text = render_report(&report);

        assert!(text.contains("**Current branch:** `ENG-12-fix-bug`"), "{text}");
        assert!(text.contains("Issue key(s) found in branch name: ENG-12"), "{text}");
        assert!(text.contains("`d4e5f6` cleanup [no issue key]"), "{text}");
        assert!(text.contains("1/2 commits are missing issue keys"), "{text}");
        assert!(text.contains("Set LINEAR_API_KEY"), "{text}");
        assert!(!text.contains("Linear issue verification"), "{text}");
    }

    #[test]
    fn active_tracker_lists_assignment_and_unverifiable_keys() {
        let verified = KeyClassification {
            key: key("ENG-12"),
            in_branch: true,
            commits: vec!["a1b2c3".to_string()],
            verification: KeyVerification::Verified {
                title: "Fix bug".to_string(),
                state_name: "In Progress".to_string(),
                assignment: Some(Assignment::AssignedToCaller),
            },
        };
        let mut report = sample_report(
            TrackerStatus::Active,
            vec![verified, unverifiable("ENG-99")],
        );
        report.viewer = Some(ViewerIdentity("user-1".to_string()));
        report.issues.insert(
            key("ENG-12"),
            RemoteIssue {
                key: key("ENG-12"),
                title: "Fix bug".to_string(),
                state_name: "In Progress".to_string(),
                assignee_id: Some("user-1".to_string()),
            },
        );
        let text = render_report(&report);

        assert!(
            text.contains("**ENG-12**: Fix bug, *In Progress* (assigned to you ✅)"),
            "{text}"
        );
        assert!(text.contains("Could not verify: ENG-99."), "{text}");
    }

    #[test]
    fn unavailable_tracker_warns_about_key() {
        let report = sample_report(TrackerStatus::Unavailable, vec![unverifiable("ENG-12")]);
        let text = render_report(&report);
        assert!(text.contains("The key may be invalid"), "{text}");
    }

    #[test]
    fn empty_history_and_branch_hint() {
        let branch = BranchInfo {
            name: "main".to_string(),
            detached: false,
            issue_keys: Vec::new(),
        };
        let text = render_empty_history(&branch);
        assert!(text.contains("git branch -m <ENG-XXX>-main"), "{text}");
        assert!(text.contains("No commits found in this repository yet."), "{text}");

        let result = outcome_result(&HygieneOutcome::EmptyHistory { branch });
        assert_ne!(result.is_error, Some(true));
        assert_eq!(result_text(&result), text);
        let structured = result.structured_content.expect("structured content");
        assert_eq!(structured["status"], "empty_history");
    }

    #[test]
    fn not_a_repository_is_an_error_result() {
        let result = outcome_result(&HygieneOutcome::NotARepository {
            message: "fatal: not a git repository".to_string(),
        });
        assert_eq!(result.is_error, Some(true));
        let text = result_text(&result);
        assert!(
            text.starts_with("Error: This directory is not a git repository"),
            "{text}"
        );
        assert!(text.contains("details: fatal: not a git repository"), "{text}");
        let structured = result.structured_content.expect("structured content");
        assert_eq!(structured["error"]["code"], "not_a_repository");
        assert_eq!(structured["error"]["details"], "fatal: not a git repository");
    }

    #[test]
    fn all_commits_keyed_summary() {
        let mut report = sample_report(TrackerStatus::NotNeeded, Vec::new());
        report.commits.truncate(1);
        report.summary.commits_total = 1;
        report.summary.commits_missing_keys = 0;
        let text = render_report(&report);
        assert!(text.contains("All 1 commits have issue keys."), "{text}");
    }
}
