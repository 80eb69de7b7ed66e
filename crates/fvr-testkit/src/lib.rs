//! fvr-testkit
//!
//! In-memory doubles for the two remote systems plus small fixture builders
//! used by the scenario tests of the other crates.

pub mod fake_serving;
pub mod fake_vcs;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use fvr_history::{ReviewRequestRef, TrackedFile};
use fvr_normalize::PredictionDoc;

pub use fake_serving::FakeServing;
pub use fake_vcs::FakeVcs;

pub const DATA_ROOT: &str = "data-processed";
pub const TARGET: &str = "1 wk ahead cum death";
/// A Monday; week-1 targets end on 2020-05-09.
pub const FORECAST_DATE: &str = "2020-05-04";
pub const TARGET_END_DATE: &str = "2020-05-09";

/// Tracked file for `dataset` at [`FORECAST_DATE`].
pub fn tracked(dataset: &str) -> TrackedFile {
    TrackedFile::new(dataset, FORECAST_DATE)
}

/// Repository path of [`tracked`] under [`DATA_ROOT`].
pub fn tracked_path(dataset: &str) -> String {
    tracked(dataset).path(DATA_ROOT)
}

pub fn rr(id: u64, number: u64) -> ReviewRequestRef {
    ReviewRequestRef { id, number }
}

/// UTC instant on 2020-05-`day` at `hour`:00:00.
pub fn merged_at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 5, day, hour, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Hub quantile CSV with one point row per `(location, value)`.
pub fn point_csv(rows: &[(&str, f64)]) -> String {
    let mut out = String::from("forecast_date,target,target_end_date,location,type,quantile,value\n");
    for (location, value) in rows {
        out.push_str(&format!(
            "{FORECAST_DATE},{TARGET},{TARGET_END_DATE},{location},point,NA,{value}\n"
        ));
    }
    out
}

/// Serving-system document with one point prediction per `(unit, value)`.
pub fn point_doc(rows: &[(&str, f64)]) -> PredictionDoc {
    PredictionDoc {
        meta: json!({}),
        predictions: rows
            .iter()
            .map(|(unit, value)| fvr_normalize::predictions::PredictionElement {
                unit: unit.to_string(),
                target: TARGET.to_string(),
                class: "point".to_string(),
                prediction: json!({ "value": value }),
            })
            .collect(),
    }
}
