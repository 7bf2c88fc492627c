//! # Hygiene Engine
//!
//! Checks that recent git history is traceable to issue tracker work items.
//!
//! ## Architecture
//!
//! ```text
//! GitReader (branch, git log --oneline)
//!     │
//!     ├──> extract_issue_keys  ([A-Z]{2,10}-[0-9]+)
//!     │
//!     ├──> IssueTracker (optional, Linear GraphQL)
//!     │      ├─ viewer identity
//!     │      └─ one lookup per key, bounded fan-out, failures omitted
//!     │
//!     └──> HygieneEngine
//!            ├─ classify commits (has keys / missing keys)
//!            ├─ classify keys (verified + assignment / unverifiable)
//!            └─ HygieneOutcome
//! ```

mod config;
mod error;
mod extract;
mod model;
mod reconcile;
mod tracker;
mod vcs;

pub use config::{HygieneConfig, DEFAULT_LINEAR_API_URL};
pub use error::{HygieneError, Result};
pub use extract::{extract_issue_keys, unique_issue_keys};
pub use model::{
    Assignment, BranchInfo, Commit, CommitCount, CommitStatus, HygieneOutcome, HygieneReport,
    HygieneSummary, IssueKey, KeyClassification, KeyVerification, LogEntry, RemoteIssue,
    TrackerStatus, ViewerIdentity, DEFAULT_COMMIT_COUNT, DETACHED_BRANCH, MAX_COMMIT_COUNT,
    MIN_COMMIT_COUNT,
};
pub use reconcile::HygieneEngine;
pub use tracker::{tracker_from_config, DisabledTracker, IssueTracker, LinearClient};
pub use vcs::{GitReader, VcsReader};
