//! CSV report writing.
//!
//! Columns: `model,timezero,v1_github_timestamp,...,vK_github_timestamp,in_zoltar`
//! with K = max(3, longest history). Missing timestamps are empty cells.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use fvr_reconcile::VersionReport;

/// Minimum number of timestamp columns.
pub const MIN_TIMESTAMP_COLUMNS: usize = 3;

pub const COMBINED_FILE: &str = "model-forecast-versions.csv";
pub const INDIVIDUAL_DIR: &str = "individual";

pub fn timestamp_columns(reports: &[VersionReport]) -> usize {
    reports
        .iter()
        .map(|r| r.timestamps.len())
        .max()
        .unwrap_or(0)
        .max(MIN_TIMESTAMP_COLUMNS)
}

pub fn header(k: usize) -> Vec<String> {
    let mut h = vec!["model".to_string(), "timezero".to_string()];
    h.extend((1..=k).map(|i| format!("v{i}_github_timestamp")));
    h.push("in_zoltar".to_string());
    h
}

fn row(report: &VersionReport, k: usize) -> Vec<String> {
    let mut r = vec![report.dataset.clone(), report.time_key.clone()];
    r.extend((0..k).map(|i| report.timestamps.get(i).cloned().unwrap_or_default()));
    r.push(report.version_label());
    r
}

pub fn write_csv(path: &Path, reports: &[VersionReport], k: usize) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("create report failed: {}", path.display()))?;
    w.write_record(header(k))?;
    for report in reports {
        w.write_record(row(report, k))?;
    }
    w.flush()
        .with_context(|| format!("flush report failed: {}", path.display()))?;
    Ok(())
}

/// Write `individual/{dataset}.csv` per dataset plus the combined report.
///
/// `reports` must already be sorted; returns the written paths.
pub fn write_outputs(out_dir: &Path, reports: &[VersionReport]) -> Result<Vec<PathBuf>> {
    let individual = out_dir.join(INDIVIDUAL_DIR);
    fs::create_dir_all(&individual)
        .with_context(|| format!("create output dir failed: {}", individual.display()))?;

    let k = timestamp_columns(reports);
    let mut by_dataset: BTreeMap<&str, Vec<VersionReport>> = BTreeMap::new();
    for r in reports {
        by_dataset.entry(r.dataset.as_str()).or_default().push(r.clone());
    }

    let mut written = Vec::with_capacity(by_dataset.len() + 1);
    for (dataset, rows) in &by_dataset {
        let path = individual.join(format!("{dataset}.csv"));
        write_csv(&path, rows, k)?;
        written.push(path);
    }

    let combined = out_dir.join(COMBINED_FILE);
    write_csv(&combined, reports, k)?;
    written.push(combined);
    Ok(written)
}
