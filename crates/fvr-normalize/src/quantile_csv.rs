//! Quantile CSV expansion (the hub's file format).
//!
//! ## Column contract (case-insensitive, order-independent)
//!
//! | Column            | Example                | Notes                            |
//! |-------------------|------------------------|----------------------------------|
//! | `location`        | `01`, `US`, `06075`    | becomes `unit`                   |
//! | `target`          | `1 wk ahead cum death` | must be in the [`TargetSet`]     |
//! | `type`            | `point` / `quantile`   | becomes `class`                  |
//! | `quantile`        | `0.025`, `NA`          | empty or `NA` for point rows     |
//! | `value`           | `152.5`                | finite number                    |
//! | `forecast_date`   | `2020-05-04`           | `YYYY-MM-DD`                     |
//! | `target_end_date` | `2020-05-09`           | must agree with target horizon   |
//!
//! Other columns (`location_name`, a leading index column) are ignored.
//! A missing required column is fatal; every other problem excludes only the
//! offending row (or quantile group) and is reported as a [`TransformError`].

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::format::{pad_unit, zero_fill, UNIT_WIDTH};
use crate::record::ComparableRecord;
use crate::targets::{Horizon, TargetSet};
use crate::{NormalizeError, TransformError, UnitCoercion};

pub const REQUIRED_COLUMNS: [&str; 5] = ["location", "target", "type", "quantile", "value"];
pub const ADDITIONAL_REQUIRED_COLUMNS: [&str; 2] = ["forecast_date", "target_end_date"];

struct ColumnIndex(HashMap<String, usize>);

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, NormalizeError> {
        let idx: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
            .collect();

        for req in REQUIRED_COLUMNS.iter().chain(ADDITIONAL_REQUIRED_COLUMNS.iter()) {
            if !idx.contains_key(*req) {
                return Err(NormalizeError::MissingColumn(req.to_string()));
            }
        }
        Ok(Self(idx))
    }

    fn get<'r>(&self, rec: &'r csv::StringRecord, name: &str) -> &'r str {
        self.0
            .get(name)
            .and_then(|&i| rec.get(i))
            .map(str::trim)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Point,
    Quantile(f64),
}

#[derive(Debug, Clone)]
struct ParsedRow {
    line: usize,
    unit: String,
    target: String,
    kind: Kind,
    value: f64,
}

/// Expand quantile CSV text into long records.
///
/// Returned units are coerced per `coercion` but not yet padded; the
/// normalizer pads every unit afterwards.
pub fn expand(
    src: &str,
    targets: &TargetSet,
    coercion: UnitCoercion,
) -> Result<(Vec<ComparableRecord>, Vec<TransformError>), NormalizeError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(src.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| NormalizeError::Csv(e.to_string()))?
        .clone();
    let cols = ColumnIndex::from_headers(&headers)?;

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (i, rec) in rdr.records().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let rec = match rec {
            Ok(r) => r,
            Err(e) => {
                errors.push(TransformError::at_row(line, format!("unreadable csv record: {e}")));
                continue;
            }
        };
        if rec.iter().all(|f| f.is_empty()) {
            continue;
        }
        match parse_row(&rec, &cols, line, targets, coercion) {
            Ok(row) => rows.push(row),
            Err(e) => errors.push(e),
        }
    }

    let records = validate_groups(rows, &mut errors);
    Ok((records, errors))
}

fn parse_row(
    rec: &csv::StringRecord,
    cols: &ColumnIndex,
    line: usize,
    targets: &TargetSet,
    coercion: UnitCoercion,
) -> Result<ParsedRow, TransformError> {
    let location = cols.get(rec, "location");
    let unit = match coercion {
        UnitCoercion::Pad => location.to_string(),
        UnitCoercion::ZeroFill => zero_fill(location, UNIT_WIDTH),
    };
    let target = cols.get(rec, "target").to_string();

    let fail = |message: String| TransformError {
        row: Some(line),
        unit: Some(unit.clone()),
        target: Some(target.clone()),
        message,
    };

    if !is_valid_location(&pad_unit(&unit)) {
        return Err(fail(format!("invalid location '{location}'")));
    }
    if !targets.contains(&target) {
        return Err(fail(format!("invalid target '{target}'")));
    }

    let kind = match cols.get(rec, "type").to_ascii_lowercase().as_str() {
        "point" => {
            let q = cols.get(rec, "quantile");
            if !is_missing(q) {
                return Err(fail(format!("point row must have an empty quantile, got '{q}'")));
            }
            Kind::Point
        }
        "quantile" => {
            let q = cols.get(rec, "quantile");
            match q.parse::<f64>() {
                Ok(v) if (0.0..=1.0).contains(&v) => Kind::Quantile(v),
                _ => return Err(fail(format!("quantile must be a number in [0, 1], got '{q}'"))),
            }
        }
        other => return Err(fail(format!("invalid type '{other}', expected point | quantile"))),
    };

    let raw_value = cols.get(rec, "value");
    let value = match raw_value.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => return Err(fail(format!("value must be a finite number, got '{raw_value}'"))),
    };

    let forecast_date = parse_date(cols.get(rec, "forecast_date"))
        .ok_or_else(|| fail("forecast_date must be YYYY-MM-DD".to_string()))?;
    let target_end_date = parse_date(cols.get(rec, "target_end_date"))
        .ok_or_else(|| fail("target_end_date must be YYYY-MM-DD".to_string()))?;

    if let Some(h) = Horizon::parse(&target) {
        let expected = h.expected_end_date(forecast_date);
        if target_end_date != expected {
            return Err(fail(format!(
                "target_end_date {target_end_date} does not match {expected} \
                 expected for a forecast made on {forecast_date}"
            )));
        }
    }

    Ok(ParsedRow {
        line,
        unit,
        target,
        kind,
        value,
    })
}

/// Drop duplicate points and inconsistent quantile groups.
fn validate_groups(rows: Vec<ParsedRow>, errors: &mut Vec<TransformError>) -> Vec<ComparableRecord> {
    let mut points: BTreeMap<(String, String), ParsedRow> = BTreeMap::new();
    let mut quantiles: BTreeMap<(String, String), Vec<ParsedRow>> = BTreeMap::new();

    for row in rows {
        let key = (row.unit.clone(), row.target.clone());
        match row.kind {
            Kind::Point => {
                if let Some(first) = points.get(&key) {
                    errors.push(TransformError {
                        row: Some(row.line),
                        unit: Some(row.unit.clone()),
                        target: Some(row.target.clone()),
                        message: format!("duplicate point prediction (first on line {})", first.line),
                    });
                } else {
                    points.insert(key, row);
                }
            }
            Kind::Quantile(_) => quantiles.entry(key).or_default().push(row),
        }
    }

    let mut out: Vec<ComparableRecord> = points
        .into_values()
        .map(|r| ComparableRecord::point(r.unit, r.target, r.value))
        .collect();

    for ((unit, target), mut group) in quantiles {
        group.sort_by(|a, b| quantile_of(a).total_cmp(&quantile_of(b)));

        let problem = group.windows(2).find_map(|w| {
            let (qa, qb) = (quantile_of(&w[0]), quantile_of(&w[1]));
            if qa == qb {
                Some(format!("quantile {qa} appears more than once"))
            } else if w[1].value < w[0].value {
                Some(format!(
                    "values must be non-decreasing as quantiles increase: q={qa} -> {}, q={qb} -> {}",
                    w[0].value, w[1].value
                ))
            } else {
                None
            }
        });

        match problem {
            Some(message) => errors.push(TransformError {
                row: None,
                unit: Some(unit),
                target: Some(target),
                message,
            }),
            None => out.extend(
                group
                    .into_iter()
                    .map(|r| ComparableRecord::quantile(r.unit, r.target, quantile_of_kind(r.kind), r.value)),
            ),
        }
    }

    out
}

fn quantile_of(row: &ParsedRow) -> f64 {
    quantile_of_kind(row.kind)
}

fn quantile_of_kind(kind: Kind) -> f64 {
    match kind {
        Kind::Quantile(q) => q,
        Kind::Point => f64::NAN,
    }
}

fn is_missing(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("nan")
}

fn is_valid_location(unit: &str) -> bool {
    unit == "US" || (matches!(unit.len(), 2 | 5) && unit.chars().all(|c| c.is_ascii_digit()))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
