//! Version-control boundary: commit/review-request records and the
//! [`VersionControl`] capability trait.
//!
//! No concrete adapters and no resolution logic belong here.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

// ---------------------------------------------------------------------------
// History records
// ---------------------------------------------------------------------------

/// Identity of a collaborative review request (a pull request on GitHub).
///
/// `id` is globally unique and used for deduplication; `number` is the
/// per-repository display number and used for quarantine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReviewRequestRef {
    pub id: u64,
    pub number: u64,
}

/// A file touched by a commit or review request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    /// Where the raw file body can be fetched.
    pub content_url: String,
}

/// One commit that touched the tracked path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub commit_id: String,
    /// Review request this commit was merged through, if any.
    pub review_request: Option<ReviewRequestRef>,
    /// Files changed by the commit itself; only meaningful for direct commits.
    pub changed_files: Vec<ChangedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    pub id: u64,
    pub number: u64,
    /// `None` while the review request is open or was closed unmerged.
    pub merged_at: Option<DateTime<Utc>>,
    pub changed_files: Vec<ChangedFile>,
}

// ---------------------------------------------------------------------------
// Revisions
// ---------------------------------------------------------------------------

/// What a [`ContentRef`] was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentOrigin {
    Commit(String),
    ReviewRequest(u64),
}

/// Lazily fetchable pointer to one version of the file body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRef {
    pub origin: ContentOrigin,
    pub path: String,
    pub content_url: String,
}

/// Display format used for merge timestamps in reports.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%y-%H:%M:%S";

/// When a revision arrived, as far as history can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceTimestamp {
    /// Merge time of a reviewed merge, in the display timezone.
    Merged(DateTime<Tz>),
    /// Un-reviewed direct commit; no merge time exists.
    Direct,
}

impl fmt::Display for SequenceTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceTimestamp::Merged(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            SequenceTimestamp::Direct => f.write_str("None"),
        }
    }
}

/// One content-bearing version of a tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub sequence_timestamp: SequenceTimestamp,
    /// `None` when the review request did not carry the tracked path.
    pub content: Option<ContentRef>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`VersionControl`] implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsError {
    /// Network or transport failure.
    Transport(String),
    /// The upstream API answered with a non-success status.
    Api { status: u16, message: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// The requested object does not exist.
    NotFound(String),
}

impl fmt::Display for VcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsError::Transport(msg) => write!(f, "transport error: {msg}"),
            VcsError::Api { status, message } => {
                write!(f, "version control api error status={status}: {message}")
            }
            VcsError::Decode(msg) => write!(f, "decode error: {msg}"),
            VcsError::NotFound(what) => write!(f, "not found: {what}"),
        }
    }
}

impl std::error::Error for VcsError {}

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// Read-only access to the history of a repository.
#[async_trait::async_trait]
pub trait VersionControl: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Every commit that touched `path`, newest first.
    async fn list_commits(&self, path: &str) -> Result<Vec<CommitRecord>, VcsError>;

    /// Full record of a review request, including its changed files.
    async fn review_request(&self, rr: &ReviewRequestRef) -> Result<ReviewRequest, VcsError>;

    /// Raw text body behind `content`.
    async fn fetch_content(&self, content: &ContentRef) -> Result<String, VcsError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn merged_timestamp_display() {
        let ts = chrono_tz::US::Eastern
            .with_ymd_and_hms(2020, 5, 4, 9, 3, 7)
            .unwrap();
        assert_eq!(SequenceTimestamp::Merged(ts).to_string(), "05/04/20-09:03:07");
        assert_eq!(SequenceTimestamp::Direct.to_string(), "None");
    }

    #[test]
    fn vcs_error_display() {
        let err = VcsError::Api {
            status: 403,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "version control api error status=403: rate limited");
        assert_eq!(VcsError::NotFound("pulls/9".into()).to_string(), "not found: pulls/9");
    }
}
