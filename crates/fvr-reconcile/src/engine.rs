use std::sync::Arc;

use tracing::{info, warn};

use fvr_config::{MissingContentPolicy, Settings};
use fvr_history::{ensure_complete, resolve, ResolvePolicy, Revision, TrackedFile, VersionControl};
use fvr_normalize::{ComparableTable, Normalizer, RawTable, Side, TransformError};
use fvr_serving::{fetch, ServingError, ServingSystem};

use crate::{ComparisonResult, Determination, MatchOutcome, ReconcileError};

/// Decides which historical revision of a tracked file is the live one.
///
/// Holds no per-file state; one matcher may serve many files concurrently.
pub struct Matcher {
    vcs: Arc<dyn VersionControl>,
    serving: Arc<dyn ServingSystem>,
    data_root: String,
    policy: ResolvePolicy,
    missing_content: MissingContentPolicy,
    normalizer: Normalizer,
}

impl Matcher {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        serving: Arc<dyn ServingSystem>,
        settings: &Settings,
    ) -> Self {
        let precision = settings.comparison.precision;
        if !precision.is_symmetric() {
            warn!(
                canonical = precision.canonical,
                revision = precision.revision,
                "asymmetric comparison precision; values that differ only past the \
                 coarser precision will not match"
            );
        }
        Self {
            vcs,
            serving,
            data_root: settings.github.data_root.clone(),
            policy: ResolvePolicy::from_settings(&settings.comparison),
            missing_content: settings.comparison.missing_content,
            normalizer: Normalizer::from_settings(&settings.comparison),
        }
    }

    /// Resolve, fetch and compare one tracked file.
    pub async fn match_file(&self, tracked: &TrackedFile) -> Result<MatchOutcome, ReconcileError> {
        let path = tracked.path(&self.data_root);
        let revisions = resolve(self.vcs.as_ref(), &self.policy, &path).await?;
        let revisions = self.apply_missing_content(tracked, revisions)?;

        if revisions.is_empty() {
            return Err(ReconcileError::NoRevisions);
        }

        let mut outcome = MatchOutcome {
            tracked: tracked.clone(),
            revisions,
            determination: Determination::SingleRevision,
            comparison: None,
            transform_errors: Vec::new(),
        };

        if outcome.revisions.len() < 2 {
            info!(dataset = %tracked.dataset, time_key = %tracked.time_key, "single revision, nothing to compare");
            return Ok(outcome);
        }

        let snapshot = match fetch(self.serving.as_ref(), &tracked.dataset, &tracked.time_key).await {
            Ok(raw) => raw,
            Err(ServingError::NotFound { what }) => {
                warn!(dataset = %tracked.dataset, time_key = %tracked.time_key, missing = %what, "snapshot not published");
                outcome.determination = Determination::SnapshotUnpublished;
                return Ok(outcome);
            }
            Err(e) => return Err(ReconcileError::Serving(e)),
        };

        let canonical = self.normalize(&snapshot, tracked, Side::Canonical, None, &mut outcome.transform_errors)?;

        let mut matches = Vec::with_capacity(outcome.revisions.len());
        let mut newest_difference = None;
        for (i, revision) in outcome.revisions.iter().enumerate() {
            let version = i + 1;
            let body = self.fetch_body(revision, version).await?;
            let table = self.normalize(
                &RawTable::QuantileCsv(body),
                tracked,
                Side::Revision,
                Some(version),
                &mut outcome.transform_errors,
            )?;
            newest_difference = table.first_difference(&canonical);
            matches.push(newest_difference.is_none());
        }

        let comparison = ComparisonResult::new(matches);
        outcome.determination = match comparison.first_match() {
            Some(i) => Determination::Matched { version: i + 1 },
            None => {
                warn!(
                    dataset = %tracked.dataset,
                    time_key = %tracked.time_key,
                    revisions = outcome.revisions.len(),
                    newest_first_difference = ?newest_difference,
                    "no revision matches the live snapshot"
                );
                Determination::NoMatch
            }
        };
        info!(
            dataset = %tracked.dataset,
            time_key = %tracked.time_key,
            revisions = outcome.revisions.len(),
            matches = comparison.match_count(),
            determination = outcome.determination.as_str(),
            "file reconciled"
        );
        outcome.comparison = Some(comparison);
        Ok(outcome)
    }

    fn apply_missing_content(
        &self,
        tracked: &TrackedFile,
        revisions: Vec<Revision>,
    ) -> Result<Vec<Revision>, ReconcileError> {
        match self.missing_content {
            MissingContentPolicy::Abort => {
                ensure_complete(&revisions)?;
                Ok(revisions)
            }
            MissingContentPolicy::Skip => {
                let before = revisions.len();
                let kept: Vec<Revision> = revisions.into_iter().filter(|r| r.content.is_some()).collect();
                if kept.len() != before {
                    warn!(
                        dataset = %tracked.dataset,
                        time_key = %tracked.time_key,
                        dropped = before - kept.len(),
                        "revisions without content dropped before numbering"
                    );
                }
                Ok(kept)
            }
        }
    }

    async fn fetch_body(&self, revision: &Revision, version: usize) -> Result<String, ReconcileError> {
        // Content presence was enforced by apply_missing_content.
        let Some(content) = revision.content.as_ref() else {
            return Err(ReconcileError::Structural(
                fvr_history::StructuralError::MissingContent { index: version - 1 },
            ));
        };
        self.vcs
            .fetch_content(content)
            .await
            .map_err(|source| ReconcileError::Content { version, source })
    }

    fn normalize(
        &self,
        raw: &RawTable,
        tracked: &TrackedFile,
        side: Side,
        version: Option<usize>,
        errors: &mut Vec<TransformError>,
    ) -> Result<ComparableTable, ReconcileError> {
        let normalized = self
            .normalizer
            .normalize(raw, &tracked.dataset, side)
            .map_err(|source| ReconcileError::Normalize {
                side,
                version,
                source,
            })?;
        errors.extend(normalized.errors);
        Ok(normalized.table)
    }
}
