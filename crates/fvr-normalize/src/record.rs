//! Long-format forecast records and the comparable (sorted, rounded) table.

use std::cmp::Ordering;
use std::fmt;

/// One `{unit, target, class, quantile, value}` row.
///
/// `quantile` is `None` for point predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparableRecord {
    pub unit: String,
    pub target: String,
    pub class: String,
    pub quantile: Option<f64>,
    pub value: f64,
}

impl ComparableRecord {
    pub fn point(unit: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
        Self {
            unit: unit.into(),
            target: target.into(),
            class: "point".to_string(),
            quantile: None,
            value,
        }
    }

    pub fn quantile(
        unit: impl Into<String>,
        target: impl Into<String>,
        quantile: f64,
        value: f64,
    ) -> Self {
        Self {
            unit: unit.into(),
            target: target.into(),
            class: "quantile".to_string(),
            quantile: Some(quantile),
            value,
        }
    }

    /// Ordering by `(unit, target, class, quantile)`; a missing quantile sorts last.
    pub fn key_cmp(&self, other: &Self) -> Ordering {
        self.unit
            .cmp(&other.unit)
            .then_with(|| self.target.cmp(&other.target))
            .then_with(|| self.class.cmp(&other.class))
            .then_with(|| match (self.quantile, other.quantile) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }
}

impl fmt::Display for ComparableRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quantile {
            Some(q) => write!(
                f,
                "({}, {}, {}, {}, {})",
                self.unit, self.target, self.class, q, self.value
            ),
            None => write!(
                f,
                "({}, {}, {}, NA, {})",
                self.unit, self.target, self.class, self.value
            ),
        }
    }
}

/// Sorted, precision-normalized table used for equality comparison.
///
/// Two tables are equal iff their sorted record sequences are element-wise
/// equal. Construct through [`ComparableTable::from_records`] so the sort
/// invariant always holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparableTable {
    records: Vec<ComparableRecord>,
}

impl ComparableTable {
    pub fn from_records(mut records: Vec<ComparableRecord>) -> Self {
        // Stable sort keeps duplicate keys in input order.
        records.sort_by(ComparableRecord::key_cmp);
        Self { records }
    }

    pub fn records(&self) -> &[ComparableRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the first record that differs, or `None` when equal.
    ///
    /// When one table is a prefix of the other, the shorter length is returned.
    pub fn first_difference(&self, other: &Self) -> Option<usize> {
        let shared = self.records.len().min(other.records.len());
        (0..shared)
            .find(|&i| self.records[i] != other.records[i])
            .or_else(|| (self.records.len() != other.records.len()).then_some(shared))
    }
}
