use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel branch name reported when HEAD is detached.
pub const DETACHED_BRANCH: &str = "(detached HEAD)";

pub const DEFAULT_COMMIT_COUNT: u32 = 10;
pub const MIN_COMMIT_COUNT: u32 = 1;
pub const MAX_COMMIT_COUNT: u32 = 100;

/// Issue tracker identifier such as `ENG-123`.
///
/// Every key matches the `[A-Z]{2,10}-[0-9]+` shape: values come out of
/// [`crate::extract_issue_keys`] or are checked on deserialization.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(try_from = "String")]
pub struct IssueKey(String);

impl TryFrom<String> for IssueKey {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let well_formed = raw.split_once('-').is_some_and(|(team, number)| {
            (2..=10).contains(&team.len())
                && team.bytes().all(|b| b.is_ascii_uppercase())
                && !number.is_empty()
                && number.bytes().all(|b| b.is_ascii_digit())
        });
        if well_formed {
            Ok(Self(raw))
        } else {
            Err(format!("not an issue key: {raw:?}"))
        }
    }
}

impl IssueKey {
    pub(crate) fn new(raw: &str) -> Self {
        Self(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Team prefix (`ENG` in `ENG-123`).
    pub fn team(&self) -> &str {
        self.0.split_once('-').map(|(team, _)| team).unwrap_or("")
    }

    /// Numeric part, or `None` when it does not fit in a `u64`.
    pub fn number(&self) -> Option<u64> {
        self.0
            .split_once('-')
            .and_then(|(_, number)| number.parse().ok())
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of recent commits to inspect, always within `[1, 100]`.
///
/// Deserialized values go through [`CommitCount::clamped`] as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64")]
pub struct CommitCount(u32);

impl CommitCount {
    pub fn clamped(requested: i64) -> Self {
        let value = requested.clamp(i64::from(MIN_COMMIT_COUNT), i64::from(MAX_COMMIT_COUNT));
        // Clamped into u32 range above.
        Self(value as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<i64> for CommitCount {
    fn from(requested: i64) -> Self {
        Self::clamped(requested)
    }
}

impl Default for CommitCount {
    fn default() -> Self {
        Self(DEFAULT_COMMIT_COUNT)
    }
}

/// One line of `git log --oneline` before key extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub sha: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    HasKeys,
    MissingKeys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Commit {
    /// Abbreviated commit hash.
    pub sha: String,
    /// Commit subject line.
    pub message: String,
    /// Issue keys found in the message, in order of appearance.
    pub issue_keys: Vec<IssueKey>,
    pub status: CommitStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BranchInfo {
    /// Branch name, or `(detached HEAD)`.
    pub name: String,
    pub detached: bool,
    /// Issue keys found in the branch name.
    pub issue_keys: Vec<IssueKey>,
}

/// Tracker record for a key that resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RemoteIssue {
    pub key: IssueKey,
    pub title: String,
    pub state_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
}

/// Opaque id of the user the tracker credential belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ViewerIdentity(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Assignment {
    AssignedToCaller,
    AssignedToOther,
    Unassigned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyVerification {
    Verified {
        title: String,
        state_name: String,
        /// `None` when the viewer identity is unknown.
        #[serde(skip_serializing_if = "Option::is_none")]
        assignment: Option<Assignment>,
    },
    Unverifiable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KeyClassification {
    pub key: IssueKey,
    /// Key appears in the branch name.
    pub in_branch: bool,
    /// Short hashes of the commits mentioning the key, in log order.
    pub commits: Vec<String>,
    pub verification: KeyVerification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrackerStatus {
    /// No tracker credential configured.
    Disabled,
    /// Credential configured, but there were no keys to look up.
    NotNeeded,
    /// Credential configured, but the tracker returned nothing at all.
    Unavailable,
    Active,
}

impl TrackerStatus {
    /// Whether remote data in the report can be trusted.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HygieneSummary {
    pub commits_total: usize,
    pub commits_missing_keys: usize,
    pub keys_total: usize,
    pub keys_unverifiable: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HygieneReport {
    pub branch: BranchInfo,
    pub commits: Vec<Commit>,
    /// Resolved tracker records; only keys observed locally can appear here.
    pub issues: BTreeMap<IssueKey, RemoteIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ViewerIdentity>,
    /// One entry per distinct key, ordered by key.
    pub keys: Vec<KeyClassification>,
    pub tracker: TrackerStatus,
    pub summary: HygieneSummary,
}

/// Result of a single `check_hygiene` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HygieneOutcome {
    NotARepository { message: String },
    EmptyHistory { branch: BranchInfo },
    Checked(HygieneReport),
}
