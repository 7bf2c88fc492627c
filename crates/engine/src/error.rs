use thiserror::Error;

pub type Result<T> = std::result::Result<T, HygieneError>;

/// Errors that abort a hygiene check.
///
/// Tracker failures are deliberately absent: the tracker client converts them to
/// omissions before they reach the reconciler.
#[derive(Error, Debug)]
pub enum HygieneError {
    #[error("Not a git repository (or git is not installed): {0}")]
    NotAVcsRepository(String),
}
