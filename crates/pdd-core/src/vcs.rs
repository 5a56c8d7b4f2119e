//! Tracker provider contract.
//!
//! A [`Vcs`] is one hosted repository on one tracker (Gitea, GitHub, ...).
//! Concrete HTTP clients live outside the core and are injected as trait
//! objects or generics.

use std::fmt;

use crate::config::RepoConfig;
use crate::error::ErrorCode;

/// The author of a tracker issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueAuthor {
    pub id: String,
    pub username: String,
}

/// A tracker issue as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub author: IssueAuthor,
    pub href: String,
    pub number: String,
    pub closed: bool,
}

/// The hosted repository a tracker works against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    /// `owner/name`.
    pub full_name: String,
    pub default_branch: String,
    pub head_commit_hash: Option<String>,
}

impl RepoInfo {
    #[must_use]
    pub fn new(full_name: impl Into<String>, default_branch: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            default_branch: default_branch.into(),
            head_commit_hash: None,
        }
    }

    #[must_use]
    pub fn with_head(mut self, sha: impl Into<String>) -> Self {
        let sha = sha.into();
        self.head_commit_hash = (!sha.trim().is_empty()).then_some(sha);
        self
    }

    /// Ref used in deep links: the head commit when known, else the default branch.
    #[must_use]
    pub fn link_ref(&self) -> &str {
        self.head_commit_hash
            .as_deref()
            .unwrap_or(&self.default_branch)
    }
}

/// Tracker call that failed, for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchIssue,
    CreateIssue,
    CloseIssue,
    AddComment,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FetchIssue => "fetch issue",
            Self::CreateIssue => "create issue",
            Self::CloseIssue => "close issue",
            Self::AddComment => "add comment",
        })
    }
}

/// A tracker request that did not succeed.
///
/// `subject` names what the request was about, e.g. `owner/repo#12`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("{operation} failed for {subject}: HTTP {status}: {body}")]
    Status {
        operation: Operation,
        subject: String,
        status: u16,
        body: String,
    },

    #[error("{operation} failed for {subject}: {message}")]
    Network {
        operation: Operation,
        subject: String,
        message: String,
    },

    #[error("{operation} for {subject} returned an unexpected response: {message}")]
    Decode {
        operation: Operation,
        subject: String,
        message: String,
    },
}

impl TransportError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Status { .. } | Self::Network { .. } => ErrorCode::TrackerRequestFailed,
            Self::Decode { .. } => ErrorCode::TrackerResponseInvalid,
        }
    }

    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Status { operation, .. }
            | Self::Network { operation, .. }
            | Self::Decode { operation, .. } => *operation,
        }
    }
}

/// One repository on one issue tracker.
pub trait Vcs {
    /// Provider name, e.g. `gitea` or `github`.
    fn name(&self) -> &str;

    fn repo(&self) -> &RepoInfo;

    /// Configuration read from the repository's `.0nepdd.yml`.
    fn config(&self) -> &RepoConfig;

    /// Fetch issue `number`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request fails or the response
    /// cannot be decoded.
    fn issue(&self, number: &str) -> Result<Issue, TransportError>;

    /// Open a new issue. `None` means the provider chose not to create one.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the tracker rejects or drops the call.
    fn create_issue(&self, title: &str, body: &str) -> Result<Option<Issue>, TransportError>;

    /// # Errors
    ///
    /// Returns [`TransportError`] when the tracker rejects or drops the call.
    fn close_issue(&self, number: &str) -> Result<(), TransportError>;

    /// # Errors
    ///
    /// Returns [`TransportError`] when the tracker rejects or drops the call.
    fn add_comment(&self, number: &str, message: &str) -> Result<(), TransportError>;

    /// Browser link to `file` lines `start..=stop` at `sha`.
    fn puzzle_link_for_commit(&self, sha: &str, file: &str, start: &str, stop: &str) -> String;
}
