use std::fmt;

use serde::Serialize;

use fvr_history::{ResolveError, Revision, StructuralError, TrackedFile, VcsError};
use fvr_normalize::{NormalizeError, Side, TransformError};
use fvr_serving::ServingError;

/// One boolean per compared revision, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComparisonResult {
    pub matches: Vec<bool>,
}

impl ComparisonResult {
    pub fn new(matches: Vec<bool>) -> Self {
        Self { matches }
    }

    /// 0-based index of the earliest matching revision.
    pub fn first_match(&self) -> Option<usize> {
        self.matches.iter().position(|&m| m)
    }

    pub fn match_count(&self) -> usize {
        self.matches.iter().filter(|&&m| m).count()
    }
}

/// How a tracked file was resolved against the live snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Determination {
    /// Fewer than two revisions; version 1 by definition, nothing compared.
    SingleRevision,
    /// 1-based version of the lowest-indexed matching revision.
    Matched { version: usize },
    /// Every revision differs from the live snapshot.
    NoMatch,
    /// The serving system holds no snapshot for this pair.
    SnapshotUnpublished,
}

impl Determination {
    pub fn version(&self) -> Option<usize> {
        match self {
            Determination::SingleRevision => Some(1),
            Determination::Matched { version } => Some(*version),
            Determination::NoMatch | Determination::SnapshotUnpublished => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Determination::SingleRevision => "single",
            Determination::Matched { .. } => "matched",
            Determination::NoMatch => "no_match",
            Determination::SnapshotUnpublished => "unpublished",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutcome {
    pub tracked: TrackedFile,
    pub revisions: Vec<Revision>,
    pub determination: Determination,
    /// `None` when no comparison ran.
    pub comparison: Option<ComparisonResult>,
    /// Rows excluded while normalizing, across every table of this file.
    pub transform_errors: Vec<TransformError>,
}

impl MatchOutcome {
    pub fn report(&self) -> VersionReport {
        VersionReport {
            dataset: self.tracked.dataset.clone(),
            time_key: self.tracked.time_key.clone(),
            timestamps: self
                .revisions
                .iter()
                .map(|r| r.sequence_timestamp.to_string())
                .collect(),
            determined_version: self.determination.version(),
        }
    }
}

/// Persistable per-file result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VersionReport {
    pub dataset: String,
    pub time_key: String,
    /// Display form of each revision's sequence timestamp, oldest first.
    pub timestamps: Vec<String>,
    pub determined_version: Option<usize>,
}

impl VersionReport {
    /// `v{N}` or empty when undetermined.
    pub fn version_label(&self) -> String {
        self.determined_version
            .map(|v| format!("v{v}"))
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Per-file failure; the driver logs it and moves on.
#[derive(Clone, Debug, PartialEq)]
pub enum ReconcileError {
    History(ResolveError),
    Structural(StructuralError),
    NoRevisions,
    Serving(ServingError),
    /// Fetching the body of revision `version` (1-based) failed.
    Content { version: usize, source: VcsError },
    Normalize {
        side: Side,
        version: Option<usize>,
        source: NormalizeError,
    },
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::History(e) => write!(f, "{e}"),
            ReconcileError::Structural(e) => write!(f, "structural error: {e}"),
            ReconcileError::NoRevisions => write!(f, "no revisions found in history"),
            ReconcileError::Serving(e) => write!(f, "snapshot fetch failed: {e}"),
            ReconcileError::Content { version, source } => {
                write!(f, "content of v{version} could not be fetched: {source}")
            }
            ReconcileError::Normalize {
                side,
                version: Some(v),
                source,
            } => write!(f, "{} table v{v} could not be normalized: {source}", side.as_str()),
            ReconcileError::Normalize {
                side,
                version: None,
                source,
            } => write!(f, "{} table could not be normalized: {source}", side.as_str()),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::History(e) => Some(e),
            ReconcileError::Structural(e) => Some(e),
            ReconcileError::NoRevisions => None,
            ReconcileError::Serving(e) => Some(e),
            ReconcileError::Content { source, .. } => Some(source),
            ReconcileError::Normalize { source, .. } => Some(source),
        }
    }
}

impl From<ResolveError> for ReconcileError {
    fn from(e: ResolveError) -> Self {
        ReconcileError::History(e)
    }
}

impl From<StructuralError> for ReconcileError {
    fn from(e: StructuralError) -> Self {
        ReconcileError::Structural(e)
    }
}
