//! Reconciliation driver: finds tracked files in a local checkout and runs
//! the matcher over them with bounded concurrency.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures_util::{stream, StreamExt};
use tracing::{debug, info, warn};

use fvr_history::TrackedFile;
use fvr_reconcile::{Determination, Matcher, VersionReport};

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Tracked files under `data_dir`, sorted by (dataset, time key).
///
/// `data_dir` holds one directory per dataset; names containing `.` are not
/// datasets. Inside, only `{time_key}-{dataset}.csv` files are tracked, and
/// time keys before `skip_before` are left out. A non-empty `only` restricts
/// discovery to those dataset names.
pub fn discover(data_dir: &Path, only: &[String], skip_before: NaiveDate) -> Result<Vec<TrackedFile>> {
    let mut out = Vec::new();

    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("read data dir failed: {}", data_dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("list data dir failed: {}", data_dir.display()))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.contains('.') || !entry.path().is_dir() {
            continue;
        }
        if !only.is_empty() && !only.iter().any(|d| d == &name) {
            continue;
        }

        let files = fs::read_dir(entry.path())
            .with_context(|| format!("read dataset dir failed: {}", entry.path().display()))?;
        for file in files {
            let file = file?;
            let file_name = file.file_name().to_string_lossy().to_string();
            let Some(tracked) = TrackedFile::from_file_name(&name, &file_name) else {
                debug!(dataset = %name, file = %file_name, "not a forecast file");
                continue;
            };
            match tracked.date() {
                Some(d) if d >= skip_before => out.push(tracked),
                _ => debug!(dataset = %name, time_key = %tracked.time_key, "before cutoff"),
            }
        }
    }

    out.sort();
    Ok(out)
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub matched: usize,
    pub no_match: usize,
    pub single: usize,
    pub unpublished: usize,
    pub failed: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "files={} matched={} no_match={} single={} unpublished={} failed={}",
            self.files, self.matched, self.no_match, self.single, self.unpublished, self.failed
        )
    }
}

/// Match every file, at most `concurrency` in flight.
///
/// A failing file is logged and counted; it produces no report row.
pub async fn run(
    matcher: Arc<Matcher>,
    files: Vec<TrackedFile>,
    concurrency: usize,
) -> (Vec<VersionReport>, RunSummary) {
    let mut summary = RunSummary {
        files: files.len(),
        ..RunSummary::default()
    };

    let results: Vec<_> = stream::iter(files)
        .map(|tracked| {
            let matcher = Arc::clone(&matcher);
            async move {
                let result = matcher.match_file(&tracked).await;
                (tracked, result)
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut reports = Vec::with_capacity(results.len());
    for (tracked, result) in results {
        match result {
            Ok(outcome) => {
                match outcome.determination {
                    Determination::SingleRevision => summary.single += 1,
                    Determination::Matched { .. } => summary.matched += 1,
                    Determination::NoMatch => summary.no_match += 1,
                    Determination::SnapshotUnpublished => summary.unpublished += 1,
                }
                reports.push(outcome.report());
            }
            Err(e) => {
                warn!(dataset = %tracked.dataset, time_key = %tracked.time_key, error = %e, "file skipped");
                summary.failed += 1;
            }
        }
    }

    reports.sort_by(|a, b| (&a.dataset, &a.time_key).cmp(&(&b.dataset, &b.time_key)));
    info!(%summary, "reconciliation finished");
    (reports, summary)
}
