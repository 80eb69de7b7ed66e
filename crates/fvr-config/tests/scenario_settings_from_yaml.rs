//! Typed settings honour overrides from layered YAML.

use chrono::NaiveDate;
use fvr_config::{load_layered_yaml_from_strings, MissingContentPolicy, Precision, Settings};

#[test]
fn overrides_are_applied() {
    let cfg = load_layered_yaml_from_strings(&[r#"
github:
  api_base: "http://127.0.0.1:9000"
  owner: "someorg"
  repo: "somehub"
  data_root: "/data-processed/"
zoltar:
  host: "http://127.0.0.1:9001"
  project: "Flu Forecasts"
comparison:
  precision: { canonical: 4, revision: 4 }
  quarantined_review_request: 99
  display_timezone: "UTC"
  zero_fill_datasets: ["X-Model"]
  missing_content: skip
driver:
  skip_before: "2021-01-03"
  concurrency: 8
"#])
    .unwrap();

    let s = Settings::from_config_json(&cfg.config_json).unwrap();
    assert_eq!(s.github.api_base, "http://127.0.0.1:9000");
    assert_eq!(s.github.owner, "someorg");
    assert_eq!(s.github.repo, "somehub");
    assert_eq!(s.github.data_root, "data-processed");
    assert_eq!(s.zoltar.host, "http://127.0.0.1:9001");
    assert_eq!(s.zoltar.project, "Flu Forecasts");
    assert_eq!(s.comparison.precision, Precision::symmetric(4));
    assert!(s.comparison.precision.is_symmetric());
    assert_eq!(s.comparison.quarantined_review_request, Some(99));
    assert_eq!(s.comparison.display_timezone, chrono_tz::UTC);
    assert!(s.comparison.uses_zero_fill("X-Model"));
    assert!(!s.comparison.uses_zero_fill("UT-Mobility"));
    assert_eq!(s.comparison.missing_content, MissingContentPolicy::Skip);
    assert_eq!(s.driver.skip_before, NaiveDate::from_ymd_opt(2021, 1, 3).unwrap());
    assert_eq!(s.driver.concurrency, 8);
}

#[test]
fn non_integer_precision_is_rejected() {
    let cfg = load_layered_yaml_from_strings(&["comparison: { precision: { revision: \"four\" } }"])
        .unwrap();
    let err = Settings::from_config_json(&cfg.config_json).unwrap_err();
    assert!(err.to_string().contains("/comparison/precision/revision"));
}
