//! Revision history resolution.
//!
//! Walks the commits touching a path (newest first), collapses commits that
//! belong to the same review request, drops the quarantined review request,
//! and returns one [`Revision`] per distinct arrival in ascending order.

use std::collections::HashSet;
use std::fmt;

use chrono_tz::Tz;
use fvr_config::settings::ComparisonSettings;
use tracing::{debug, info};

use crate::vcs::{
    ChangedFile, ContentOrigin, ContentRef, Revision, SequenceTimestamp, VcsError, VersionControl,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvePolicy {
    /// Review-request number that never yields a revision; `None` disables.
    pub quarantined_review_request: Option<u64>,
    pub display_timezone: Tz,
}

impl ResolvePolicy {
    pub fn from_settings(settings: &ComparisonSettings) -> Self {
        Self {
            quarantined_review_request: settings.quarantined_review_request,
            display_timezone: settings.display_timezone,
        }
    }
}

impl Default for ResolvePolicy {
    fn default() -> Self {
        Self::from_settings(&ComparisonSettings::default())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    Vcs(VcsError),
    /// A commit points at a review request that was never merged.
    UnmergedReviewRequest { number: u64 },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Vcs(e) => write!(f, "history lookup failed: {e}"),
            ResolveError::UnmergedReviewRequest { number } => {
                write!(f, "review request #{number} has no merge timestamp")
            }
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Vcs(e) => Some(e),
            ResolveError::UnmergedReviewRequest { .. } => None,
        }
    }
}

impl From<VcsError> for ResolveError {
    fn from(e: VcsError) -> Self {
        ResolveError::Vcs(e)
    }
}

/// Revision list is internally inconsistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralError {
    /// Revision at `index` (0-based, oldest first) has a timestamp but no content.
    MissingContent { index: usize },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralError::MissingContent { index } => write!(
                f,
                "revision v{} has a timestamp but no content for the tracked path",
                index + 1
            ),
        }
    }
}

impl std::error::Error for StructuralError {}

/// Every revision must carry content.
pub fn ensure_complete(revisions: &[Revision]) -> Result<(), StructuralError> {
    match revisions.iter().position(|r| r.content.is_none()) {
        Some(index) => Err(StructuralError::MissingContent { index }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

fn first_matching(files: &[ChangedFile], path: &str, origin: ContentOrigin) -> Option<ContentRef> {
    files.iter().find(|f| f.path == path).map(|f| ContentRef {
        origin,
        path: f.path.clone(),
        content_url: f.content_url.clone(),
    })
}

/// Ordered, deduplicated revisions of `path`, oldest first.
pub async fn resolve(
    vcs: &dyn VersionControl,
    policy: &ResolvePolicy,
    path: &str,
) -> Result<Vec<Revision>, ResolveError> {
    let commits = vcs.list_commits(path).await?;
    let mut seen: HashSet<u64> = HashSet::new();
    let mut newest_first: Vec<Revision> = Vec::with_capacity(commits.len());

    for commit in &commits {
        let Some(rr) = commit.review_request else {
            newest_first.push(Revision {
                sequence_timestamp: SequenceTimestamp::Direct,
                content: first_matching(
                    &commit.changed_files,
                    path,
                    ContentOrigin::Commit(commit.commit_id.clone()),
                ),
            });
            continue;
        };

        if policy.quarantined_review_request == Some(rr.number) {
            debug!(path, commit = %commit.commit_id, number = rr.number, "skipping quarantined review request");
            continue;
        }
        if !seen.insert(rr.id) {
            debug!(path, commit = %commit.commit_id, number = rr.number, "review request already recorded");
            continue;
        }

        let review = vcs.review_request(&rr).await?;
        let merged_at = review
            .merged_at
            .ok_or(ResolveError::UnmergedReviewRequest { number: review.number })?;

        newest_first.push(Revision {
            sequence_timestamp: SequenceTimestamp::Merged(
                merged_at.with_timezone(&policy.display_timezone),
            ),
            content: first_matching(
                &review.changed_files,
                path,
                ContentOrigin::ReviewRequest(review.number),
            ),
        });
    }

    newest_first.reverse();
    info!(
        path,
        commits = commits.len(),
        revisions = newest_first.len(),
        source = vcs.source_name(),
        "resolved revision history"
    );
    Ok(newest_first)
}
