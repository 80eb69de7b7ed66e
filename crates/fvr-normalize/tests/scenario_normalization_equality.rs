use fvr_config::Precision;
use fvr_normalize::*;
use serde_json::json;

const HEADER: &str = "forecast_date,target,target_end_date,location,type,quantile,value";

fn normalizer() -> Normalizer {
    Normalizer::new(Precision::default(), vec![], TargetSet::covid19())
}

#[test]
fn scenario_row_order_and_unit_padding_do_not_matter() {
    let a = format!(
        "{HEADER}\n\
         2020-05-04,1 wk ahead cum death,2020-05-09,02,point,NA,7\n\
         2020-05-04,1 wk ahead cum death,2020-05-09,01,quantile,0.5,3\n\
         2020-05-04,1 wk ahead cum death,2020-05-09,01,point,NA,3\n"
    );
    let b = format!(
        "{HEADER}\n\
         2020-05-04,1 wk ahead cum death,2020-05-09,1,point,NA,3\n\
         2020-05-04,1 wk ahead cum death,2020-05-09,2,point,,7\n\
         2020-05-04,1 wk ahead cum death,2020-05-09,1,quantile,0.5,3\n"
    );
    let n = normalizer();
    let ta = n.normalize(&RawTable::QuantileCsv(a), "M", Side::Revision).unwrap();
    let tb = n.normalize(&RawTable::QuantileCsv(b), "M", Side::Revision).unwrap();

    assert!(ta.errors.is_empty() && tb.errors.is_empty());
    assert_eq!(ta.table.len(), 3);
    assert_eq!(ta.table, tb.table);
}

#[test]
fn scenario_csv_and_prediction_doc_agree_under_symmetric_precision() {
    let csv = format!(
        "{HEADER}\n\
         2020-05-04,1 wk ahead cum death,2020-05-09,1,quantile,0.025,8.00001\n\
         2020-05-04,1 wk ahead cum death,2020-05-09,1,point,NA,12\n\
         2020-05-04,1 wk ahead cum death,2020-05-09,1,quantile,0.975,20\n"
    );
    let doc: PredictionDoc = serde_json::from_value(json!({
        "meta": {},
        "predictions": [
            { "unit": "01", "target": "1 wk ahead cum death", "class": "quantile",
              "prediction": { "quantile": [0.025, 0.975], "value": [8.0, 20] } },
            { "unit": "01", "target": "1 wk ahead cum death", "class": "point",
              "prediction": { "value": 12 } }
        ]
    }))
    .unwrap();

    let n = Normalizer::new(Precision::symmetric(4), vec![], TargetSet::covid19());
    let rev = n.normalize(&RawTable::QuantileCsv(csv), "M", Side::Revision).unwrap();
    let can = n.normalize(&RawTable::Predictions(doc), "M", Side::Canonical).unwrap();

    assert_eq!(rev.table, can.table);
    assert_eq!(rev.table.first_difference(&can.table), None);
}

#[test]
fn scenario_precision_boundary_per_side() {
    let doc: PredictionDoc = serde_json::from_value(json!({
        "predictions": [
            { "unit": "US", "target": "1 wk ahead cum death", "class": "point",
              "prediction": { "value": 0.123450001 } }
        ]
    }))
    .unwrap();
    let raw = RawTable::Predictions(doc);
    let n = normalizer();

    let can = n.normalize(&raw, "M", Side::Canonical).unwrap();
    let rev = n.normalize(&raw, "M", Side::Revision).unwrap();

    assert_eq!(format!("{:.6}", can.table.records()[0].value), "0.123450");
    assert_eq!(rev.table.records()[0].value, 0.1235);
    assert_ne!(can.table, rev.table);
}

#[test]
fn scenario_invalid_rows_are_reported_not_compared() {
    let csv = format!(
        "{HEADER}\n\
         2020-05-04,1 wk ahead cum death,2020-05-09,01,point,NA,3\n\
         2020-05-04,not a target,2020-05-09,01,point,NA,3\n"
    );
    let out = normalizer()
        .normalize(&RawTable::QuantileCsv(csv), "M", Side::Revision)
        .unwrap();
    assert_eq!(out.table.len(), 1);
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].row, Some(3));
}
