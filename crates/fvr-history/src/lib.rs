//! fvr-history
//!
//! Revision history of tracked forecast files: the version-control boundary,
//! the GitHub adapter, and the resolver that turns raw commit history into
//! an ordered list of revisions.
//!
//! Content bodies are never fetched here; a [`Revision`] only carries a
//! [`ContentRef`] that callers resolve through [`VersionControl::fetch_content`].

pub mod github;
pub mod resolver;
pub mod vcs;

use chrono::NaiveDate;

pub use github::GitHubClient;
pub use resolver::{ensure_complete, resolve, ResolveError, ResolvePolicy, StructuralError};
pub use vcs::{
    ChangedFile, CommitRecord, ContentOrigin, ContentRef, ReviewRequest, ReviewRequestRef,
    Revision, SequenceTimestamp, VcsError, VersionControl,
};

/// A (dataset, time key) pair whose file history is reconciled.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackedFile {
    pub dataset: String,
    /// Forecast date, `YYYY-MM-DD`.
    pub time_key: String,
}

impl TrackedFile {
    pub fn new(dataset: impl Into<String>, time_key: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            time_key: time_key.into(),
        }
    }

    /// Repository path: `{data_root}/{dataset}/{time_key}-{dataset}.csv`.
    pub fn path(&self, data_root: &str) -> String {
        format!(
            "{}/{}/{}-{}.csv",
            data_root.trim_end_matches('/'),
            self.dataset,
            self.time_key,
            self.dataset
        )
    }

    /// Parse a file name of the form `{time_key}-{dataset}.csv`.
    ///
    /// The time key is the leading `YYYY-MM-DD`; the remainder must equal
    /// `dataset`.
    pub fn from_file_name(dataset: &str, file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(".csv")?;
        let time_key = stem.get(..10)?;
        NaiveDate::parse_from_str(time_key, "%Y-%m-%d").ok()?;
        if stem.get(10..)? != format!("-{dataset}") {
            return None;
        }
        Some(Self::new(dataset, time_key))
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.time_key, "%Y-%m-%d").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_layout() {
        let t = TrackedFile::new("COVIDhub-ensemble", "2020-05-04");
        assert_eq!(
            t.path("data-processed/"),
            "data-processed/COVIDhub-ensemble/2020-05-04-COVIDhub-ensemble.csv"
        );
    }

    #[test]
    fn from_file_name_accepts_only_matching_dataset() {
        let t = TrackedFile::from_file_name("UT-Mobility", "2020-05-11-UT-Mobility.csv").unwrap();
        assert_eq!(t.time_key, "2020-05-11");
        assert_eq!(t.date(), NaiveDate::from_ymd_opt(2020, 5, 11));

        assert!(TrackedFile::from_file_name("UT-Mobility", "2020-05-11-Other.csv").is_none());
        assert!(TrackedFile::from_file_name("UT-Mobility", "2020-05-11-UT-Mobility.txt").is_none());
        assert!(TrackedFile::from_file_name("UT-Mobility", "metadata-UT-Mobility.csv").is_none());
        assert!(TrackedFile::from_file_name("M", "x.csv").is_none());
    }
}
