use std::sync::Arc;

use fvr_config::{Precision, Settings};
use fvr_reconcile::*;
use fvr_testkit::*;

const DATASET: &str = "M";

fn matcher(vcs: &Arc<FakeVcs>, serving: &Arc<FakeServing>, settings: &Settings) -> Matcher {
    Matcher::new(vcs.clone(), serving.clone(), settings)
}

fn history(values: &[f64]) -> FakeVcs {
    let path = tracked_path(DATASET);
    let mut vcs = FakeVcs::new();
    for (i, v) in values.iter().enumerate() {
        let n = i as u64 + 1;
        vcs.push_merged(
            &path,
            rr(100 + n, n),
            Some(merged_at(4 + n as u32, 12)),
            Some(&point_csv(&[("01", *v)])),
        );
    }
    vcs
}

fn serving_with(value: f64) -> FakeServing {
    FakeServing::new().with_snapshot(DATASET, FORECAST_DATE, point_doc(&[("1", value)]))
}

#[tokio::test]
async fn scenario_single_revision_never_downloads() {
    let vcs = Arc::new(history(&[10.0]));
    let serving = Arc::new(FakeServing::new());

    let outcome = matcher(&vcs, &serving, &Settings::default())
        .match_file(&tracked(DATASET))
        .await
        .unwrap();

    assert_eq!(outcome.determination, Determination::SingleRevision);
    assert_eq!(outcome.comparison, None);
    assert_eq!(outcome.report().determined_version, Some(1));
    assert_eq!(serving.download_calls(), 0);
    assert_eq!(vcs.content_fetches(), 0);
}

#[tokio::test]
async fn scenario_no_revision_matches() {
    let vcs = Arc::new(history(&[5.0, 6.0]));
    let serving = Arc::new(serving_with(7.0));

    let outcome = matcher(&vcs, &serving, &Settings::default())
        .match_file(&tracked(DATASET))
        .await
        .unwrap();

    assert_eq!(outcome.comparison, Some(ComparisonResult::new(vec![false, false])));
    assert_eq!(outcome.determination, Determination::NoMatch);
    assert_eq!(outcome.report().version_label(), "");
    assert_eq!(serving.download_calls(), 1);
}

#[tokio::test]
async fn scenario_match_by_content_across_precisions() {
    let vcs = Arc::new(history(&[20.0, 10.00004]));
    let serving = Arc::new(serving_with(10.0));

    let outcome = matcher(&vcs, &serving, &Settings::default())
        .match_file(&tracked(DATASET))
        .await
        .unwrap();

    assert_eq!(outcome.comparison, Some(ComparisonResult::new(vec![false, true])));
    assert_eq!(outcome.determination, Determination::Matched { version: 2 });
    assert_eq!(outcome.report().version_label(), "v2");
    assert_eq!(vcs.content_fetches(), 2);
}

#[tokio::test]
async fn scenario_asymmetric_precision_misses_identical_values() {
    let vcs = Arc::new(history(&[3.14159, 3.14159]));
    let serving = Arc::new(serving_with(3.14159));

    let asymmetric = matcher(&vcs, &serving, &Settings::default())
        .match_file(&tracked(DATASET))
        .await
        .unwrap();
    assert_eq!(asymmetric.determination, Determination::NoMatch);

    let mut settings = Settings::default();
    settings.comparison.precision = Precision::symmetric(4);
    let symmetric = matcher(&vcs, &serving, &settings)
        .match_file(&tracked(DATASET))
        .await
        .unwrap();
    assert_eq!(symmetric.determination, Determination::Matched { version: 1 });
}

#[tokio::test]
async fn scenario_lowest_index_wins_when_several_match() {
    let vcs = Arc::new(history(&[10.0, 12.0, 10.0]));
    let serving = Arc::new(serving_with(10.0));

    let outcome = matcher(&vcs, &serving, &Settings::default())
        .match_file(&tracked(DATASET))
        .await
        .unwrap();

    let comparison = outcome.comparison.clone().unwrap();
    assert_eq!(comparison.matches, vec![true, false, true]);
    assert_eq!(comparison.match_count(), 2);
    assert_eq!(outcome.determination, Determination::Matched { version: 1 });
}

#[tokio::test]
async fn scenario_report_carries_every_timestamp() {
    let path = tracked_path(DATASET);
    let mut vcs = FakeVcs::new();
    vcs.push_direct(&path, &point_csv(&[("01", 1.0)]))
        .push_merged(&path, rr(1, 2), Some(merged_at(6, 16)), Some(&point_csv(&[("01", 2.0)])));
    let vcs = Arc::new(vcs);
    let serving = Arc::new(serving_with(2.0));

    let report = matcher(&vcs, &serving, &Settings::default())
        .match_file(&tracked(DATASET))
        .await
        .unwrap()
        .report();

    assert_eq!(
        report,
        VersionReport {
            dataset: DATASET.into(),
            time_key: FORECAST_DATE.into(),
            timestamps: vec!["None".into(), "05/06/20-12:00:00".into()],
            determined_version: Some(2),
        }
    );
}
