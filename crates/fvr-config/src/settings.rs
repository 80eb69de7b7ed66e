//! Typed settings extracted from the merged config JSON.
//!
//! Every value has a default that reproduces the historical reconciliation of
//! the COVID-19 forecast hub against Zoltar, so an empty config is valid.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde_json::Value;

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_OWNER: &str = "reichlab";
pub const DEFAULT_GITHUB_REPO: &str = "covid19-forecast-hub";
pub const DEFAULT_DATA_ROOT: &str = "data-processed";
pub const DEFAULT_ZOLTAR_HOST: &str = "https://zoltardata.com";
pub const DEFAULT_ZOLTAR_PROJECT: &str = "COVID-19 Forecasts";

/// Review request whose merged content is known to be wrong. Never counted as a revision.
pub const DEFAULT_QUARANTINED_REVIEW_REQUEST: u64 = 720;

/// Upper bound for decimal places; f64 carries ~15-17 significant digits.
const MAX_PRECISION: u32 = 15;

/// Decimal places applied to `value` on each side of the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    pub canonical: u32,
    pub revision: u32,
}

impl Precision {
    pub fn symmetric(places: u32) -> Self {
        Self {
            canonical: places,
            revision: places,
        }
    }

    pub fn is_symmetric(&self) -> bool {
        self.canonical == self.revision
    }
}

impl Default for Precision {
    /// The published snapshot was rounded to 6 places and hub files to 4.
    fn default() -> Self {
        Self {
            canonical: 6,
            revision: 4,
        }
    }
}

/// What to do with a revision that has a timestamp but no content file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingContentPolicy {
    /// The whole tracked file fails with a structural error.
    #[default]
    Abort,
    /// The revision is dropped before numbering.
    Skip,
}

impl MissingContentPolicy {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(anyhow!(
                "invalid comparison.missing_content '{}'. expected one of: abort | skip",
                other
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Skip => "skip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubSettings {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Directory inside the repository that holds one folder per dataset.
    pub data_root: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoltarSettings {
    pub host: String,
    pub project: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSettings {
    pub precision: Precision,
    /// `None` disables the quarantine rule.
    pub quarantined_review_request: Option<u64>,
    pub display_timezone: Tz,
    /// Datasets whose raw location column needs string-level zero-fill.
    pub zero_fill_datasets: Vec<String>,
    pub missing_content: MissingContentPolicy,
}

impl ComparisonSettings {
    pub fn uses_zero_fill(&self, dataset: &str) -> bool {
        self.zero_fill_datasets.iter().any(|d| d == dataset)
    }
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            precision: Precision::default(),
            quarantined_review_request: Some(DEFAULT_QUARANTINED_REVIEW_REQUEST),
            display_timezone: chrono_tz::US::Eastern,
            zero_fill_datasets: vec!["UT-Mobility".to_string(), "LANL-GrowthRate".to_string()],
            missing_content: MissingContentPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    /// Time keys strictly before this date are not reconciled.
    pub skip_before: NaiveDate,
    /// Maximum number of tracked files in flight.
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub github: GithubSettings,
    pub zoltar: ZoltarSettings,
    pub comparison: ComparisonSettings,
    pub driver: DriverSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github: GithubSettings {
                api_base: DEFAULT_GITHUB_API_BASE.to_string(),
                owner: DEFAULT_GITHUB_OWNER.to_string(),
                repo: DEFAULT_GITHUB_REPO.to_string(),
                data_root: DEFAULT_DATA_ROOT.to_string(),
            },
            zoltar: ZoltarSettings {
                host: DEFAULT_ZOLTAR_HOST.to_string(),
                project: DEFAULT_ZOLTAR_PROJECT.to_string(),
            },
            comparison: ComparisonSettings::default(),
            driver: DriverSettings {
                // Earlier forecasts were committed directly, without review requests.
                skip_before: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap_or_default(),
                concurrency: 1,
            },
        }
    }
}

impl Settings {
    /// Build typed settings from the merged config JSON, falling back to defaults.
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let mut s = Settings::default();

        if let Some(v) = read_str_at(config, "/github/api_base") {
            s.github.api_base = v;
        }
        if let Some(v) = read_str_at(config, "/github/owner") {
            s.github.owner = v;
        }
        if let Some(v) = read_str_at(config, "/github/repo") {
            s.github.repo = v;
        }
        if let Some(v) = read_str_at(config, "/github/data_root") {
            s.github.data_root = v.trim_matches('/').to_string();
        }
        if let Some(v) = read_str_at(config, "/zoltar/host") {
            s.zoltar.host = v;
        }
        if let Some(v) = read_str_at(config, "/zoltar/project") {
            s.zoltar.project = v;
        }

        if let Some(p) = read_u64_at(config, "/comparison/precision/canonical")? {
            s.comparison.precision.canonical = checked_precision(p, "canonical")?;
        }
        if let Some(p) = read_u64_at(config, "/comparison/precision/revision")? {
            s.comparison.precision.revision = checked_precision(p, "revision")?;
        }

        match config.pointer("/comparison/quarantined_review_request") {
            None => {}
            Some(Value::Null) => s.comparison.quarantined_review_request = None,
            Some(_) => {
                s.comparison.quarantined_review_request =
                    read_u64_at(config, "/comparison/quarantined_review_request")?;
            }
        }

        if let Some(tz) = read_str_at(config, "/comparison/display_timezone") {
            s.comparison.display_timezone = tz
                .parse::<Tz>()
                .map_err(|e| anyhow!("invalid comparison.display_timezone '{}': {}", tz, e))?;
        }

        if let Some(v) = config.pointer("/comparison/zero_fill_datasets") {
            let arr = v
                .as_array()
                .context("comparison.zero_fill_datasets must be a list of dataset names")?;
            s.comparison.zero_fill_datasets = arr
                .iter()
                .map(|d| {
                    d.as_str()
                        .map(|x| x.trim().to_string())
                        .context("comparison.zero_fill_datasets entries must be strings")
                })
                .collect::<Result<Vec<_>>>()?;
        }

        if let Some(v) = read_str_at(config, "/comparison/missing_content") {
            s.comparison.missing_content = MissingContentPolicy::parse(&v)?;
        }

        if let Some(v) = read_str_at(config, "/driver/skip_before") {
            s.driver.skip_before = NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .with_context(|| format!("invalid driver.skip_before '{}': expected YYYY-MM-DD", v))?;
        }
        if let Some(n) = read_u64_at(config, "/driver/concurrency")? {
            if n == 0 {
                bail!("driver.concurrency must be >= 1");
            }
            s.driver.concurrency = n as usize;
        }

        Ok(s)
    }
}

fn checked_precision(p: u64, side: &str) -> Result<u32> {
    if p > MAX_PRECISION as u64 {
        bail!(
            "comparison.precision.{} must be <= {}, got {}",
            side,
            MAX_PRECISION,
            p
        );
    }
    Ok(p as u32)
}

/// Non-empty trimmed string at `pointer`, or `None`.
pub(crate) fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn read_u64_at(config: &Value, pointer: &str) -> Result<Option<u64>> {
    match config.pointer(pointer) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| anyhow!("config value at {} must be a non-negative integer", pointer)),
    }
}
