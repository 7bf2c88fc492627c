use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::model::IssueKey;

// Greedy capital run; the length check below drops runs of 11+ capitals whole
// instead of matching their last ten.
static ISSUE_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Z]+-[0-9]+").expect("issue key pattern is a valid regex")
});

const MIN_TEAM_LEN: usize = 2;
const MAX_TEAM_LEN: usize = 10;

/// Every issue key in `text`, in order of appearance, duplicates included.
///
/// Keys may sit directly after any non-capital character (`feature_ENG-1`, `fixENG-7`).
pub fn extract_issue_keys(text: &str) -> Vec<IssueKey> {
    ISSUE_KEY_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|raw| {
            raw.find('-')
                .is_some_and(|team| (MIN_TEAM_LEN..=MAX_TEAM_LEN).contains(&team))
        })
        .map(IssueKey::new)
        .collect()
}

pub fn unique_issue_keys<'a>(keys: impl IntoIterator<Item = &'a IssueKey>) -> BTreeSet<IssueKey> {
    keys.into_iter().cloned().collect()
}
