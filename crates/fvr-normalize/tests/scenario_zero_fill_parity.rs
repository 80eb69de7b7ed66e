use fvr_config::Precision;
use fvr_normalize::*;

const HEADER: &str = "forecast_date,target,target_end_date,location,type,quantile,value";

fn body(location: &str) -> String {
    format!(
        "{HEADER}\n\
         2020-05-04,1 wk ahead cum death,2020-05-09,{location},point,NA,5\n\
         2020-05-04,1 wk ahead cum death,2020-05-09,US,point,NA,50\n"
    )
}

#[test]
fn scenario_zero_fill_dataset_matches_general_path() {
    let n = Normalizer::new(
        Precision::default(),
        vec!["UT-Mobility".to_string()],
        TargetSet::covid19(),
    );

    let zero_filled = n
        .normalize(&RawTable::QuantileCsv(body("6")), "UT-Mobility", Side::Revision)
        .unwrap();
    let padded = n
        .normalize(&RawTable::QuantileCsv(body("6")), "Other-Model", Side::Revision)
        .unwrap();
    let already = n
        .normalize(&RawTable::QuantileCsv(body("06")), "Other-Model", Side::Revision)
        .unwrap();

    assert!(zero_filled.errors.is_empty());
    assert_eq!(zero_filled.table, padded.table);
    assert_eq!(padded.table, already.table);
    assert_eq!(zero_filled.table.records()[0].unit, "06");
    assert_eq!(zero_filled.table.records()[1].unit, "US");
}

#[test]
fn scenario_from_settings_uses_configured_datasets() {
    let settings = fvr_config::settings::ComparisonSettings::default();
    let n = Normalizer::from_settings(&settings);
    assert_eq!(n.places(Side::Canonical), 6);
    let out = n
        .normalize(&RawTable::QuantileCsv(body("1")), "LANL-GrowthRate", Side::Revision)
        .unwrap();
    assert_eq!(out.table.records()[0].unit, "01");
}
