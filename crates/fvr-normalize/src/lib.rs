//! fvr-normalize
//!
//! Turns either representation of a forecast (the hub's quantile CSV or the
//! serving system's nested prediction document) into a [`ComparableTable`]:
//! long-format records with padded units and rounded values, in a fixed sort
//! order. Two tables built from logically identical data compare equal.
//!
//! It does **not** fetch anything; callers hand in already-downloaded text.

pub mod format;
pub mod predictions;
pub mod quantile_csv;
pub mod record;
pub mod targets;

use std::fmt;

use fvr_config::settings::ComparisonSettings;
use fvr_config::Precision;

pub use predictions::PredictionDoc;
pub use record::{ComparableRecord, ComparableTable};
pub use targets::TargetSet;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Which side of the comparison a table comes from; selects the precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Live snapshot from the serving system.
    Canonical,
    /// One historical revision from version control.
    Revision,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Canonical => "canonical",
            Side::Revision => "revision",
        }
    }
}

/// Raw table in one of the two supported encodings.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTable {
    QuantileCsv(String),
    Predictions(PredictionDoc),
}

/// How raw CSV location text becomes a unit label before padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitCoercion {
    /// Taken as-is; padded afterwards like every other unit.
    Pad,
    /// Sign-aware string zero-fill, for datasets that publish bare numbers.
    ZeroFill,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Non-fatal problem with one row or group; the offending data is excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError {
    /// 1-based row (CSV line, or prediction element index).
    pub row: Option<usize>,
    pub unit: Option<String>,
    pub target: Option<String>,
    pub message: String,
}

impl TransformError {
    pub fn at_row(row: usize, message: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            unit: None,
            target: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(row) = self.row {
            write!(f, "row {row}: ")?;
        }
        match (&self.unit, &self.target) {
            (Some(u), Some(t)) => write!(f, "[{u} / {t}] ")?,
            (Some(u), None) => write!(f, "[{u}] ")?,
            (None, Some(t)) => write!(f, "[{t}] ")?,
            (None, None) => {}
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransformError {}

/// Fatal normalization failure; no table can be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// A required CSV column is absent.
    MissingColumn(String),
    /// The CSV text could not be read at all.
    Csv(String),
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::MissingColumn(c) => write!(f, "required column '{c}' is missing"),
            NormalizeError::Csv(msg) => write!(f, "unreadable csv: {msg}"),
        }
    }
}

impl std::error::Error for NormalizeError {}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Result of a normalization: the table plus the rows that were dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Normalized {
    pub table: ComparableTable,
    pub errors: Vec<TransformError>,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    comparison: ComparisonSettings,
    targets: TargetSet,
}

impl Normalizer {
    pub fn new(precision: Precision, zero_fill_datasets: Vec<String>, targets: TargetSet) -> Self {
        Self {
            comparison: ComparisonSettings {
                precision,
                zero_fill_datasets,
                ..ComparisonSettings::default()
            },
            targets,
        }
    }

    pub fn from_settings(settings: &ComparisonSettings) -> Self {
        Self {
            comparison: settings.clone(),
            targets: TargetSet::covid19(),
        }
    }

    /// Decimal places applied to `side`.
    pub fn places(&self, side: Side) -> u32 {
        let precision = self.comparison.precision;
        match side {
            Side::Canonical => precision.canonical,
            Side::Revision => precision.revision,
        }
    }

    fn coercion_for(&self, dataset: &str) -> UnitCoercion {
        if self.comparison.uses_zero_fill(dataset) {
            UnitCoercion::ZeroFill
        } else {
            UnitCoercion::Pad
        }
    }

    /// Expand, pad units, round values and sort.
    pub fn normalize(
        &self,
        raw: &RawTable,
        dataset: &str,
        side: Side,
    ) -> Result<Normalized, NormalizeError> {
        let (records, errors) = match raw {
            RawTable::QuantileCsv(text) => {
                quantile_csv::expand(text, &self.targets, self.coercion_for(dataset))?
            }
            RawTable::Predictions(doc) => predictions::expand(doc),
        };

        let places = self.places(side);
        let records = records
            .into_iter()
            .map(|r| ComparableRecord {
                unit: format::pad_unit(&r.unit),
                value: format::round_to(r.value, places),
                ..r
            })
            .collect();

        if !errors.is_empty() {
            tracing::warn!(
                dataset,
                side = side.as_str(),
                transform_errors = errors.len(),
                first = %errors[0],
                "rows excluded during normalization"
            );
        }

        Ok(Normalized {
            table: ComparableTable::from_records(records),
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalizer() -> Normalizer {
        Normalizer::new(Precision::default(), vec!["UT-Mobility".into()], TargetSet::covid19())
    }

    #[test]
    fn coercion_follows_configured_datasets() {
        let n = normalizer();
        assert_eq!(n.coercion_for("UT-Mobility"), UnitCoercion::ZeroFill);
        assert_eq!(n.coercion_for("COVIDhub-ensemble"), UnitCoercion::Pad);
    }

    #[test]
    fn places_follow_side() {
        let n = normalizer();
        assert_eq!(n.places(Side::Canonical), 6);
        assert_eq!(n.places(Side::Revision), 4);
    }

    #[test]
    fn predictions_are_padded_and_rounded() {
        let doc: PredictionDoc = serde_json::from_value(json!({
            "predictions": [
                { "unit": "1", "target": "1 wk ahead cum death", "class": "point",
                  "prediction": { "value": 1.23456789 } }
            ]
        }))
        .unwrap();
        let out = normalizer()
            .normalize(&RawTable::Predictions(doc), "M", Side::Canonical)
            .unwrap();
        assert!(out.errors.is_empty());
        assert_eq!(
            out.table.records(),
            &[ComparableRecord::point("01", "1 wk ahead cum death", 1.234568)]
        );
    }

    #[test]
    fn missing_column_is_fatal() {
        let err = normalizer()
            .normalize(&RawTable::QuantileCsv("location,value\n01,1\n".into()), "M", Side::Revision)
            .unwrap_err();
        assert_eq!(err, NormalizeError::MissingColumn("target".into()));
    }

    #[test]
    fn transform_error_display() {
        let e = TransformError {
            row: Some(4),
            unit: Some("01".into()),
            target: Some("t".into()),
            message: "bad".into(),
        };
        assert_eq!(e.to_string(), "row 4: [01 / t] bad");
        assert_eq!(TransformError::at_row(2, "x").to_string(), "row 2: x");
    }
}
