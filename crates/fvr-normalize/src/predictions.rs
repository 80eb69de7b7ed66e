//! Nested prediction document as served by the forecast repository.
//!
//! ```json
//! { "meta": {...},
//!   "predictions": [
//!     { "unit": "01", "target": "1 wk ahead cum death", "class": "point",
//!       "prediction": { "value": 12 } },
//!     { "unit": "01", "target": "1 wk ahead cum death", "class": "quantile",
//!       "prediction": { "quantile": [0.025, 0.5], "value": [8, 12] } } ] }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::record::ComparableRecord;
use crate::TransformError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionDoc {
    #[serde(default)]
    pub meta: Value,
    #[serde(default)]
    pub predictions: Vec<PredictionElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionElement {
    /// Unit label; numeric labels are accepted and rendered as text.
    #[serde(deserialize_with = "unit_label")]
    pub unit: String,
    pub target: String,
    pub class: String,
    pub prediction: Value,
}

fn unit_label<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Label {
        Text(String),
        Int(i64),
    }
    Ok(match Label::deserialize(de)? {
        Label::Text(s) => s,
        Label::Int(n) => n.to_string(),
    })
}

/// Flatten every element into long records; `unit` is left as served.
///
/// Elements of unsupported classes, or with malformed payloads, are skipped
/// and reported.
pub fn expand(doc: &PredictionDoc) -> (Vec<ComparableRecord>, Vec<TransformError>) {
    let mut out = Vec::new();
    let mut errors = Vec::new();

    for (i, el) in doc.predictions.iter().enumerate() {
        let err = |message: String| TransformError {
            row: Some(i + 1),
            unit: Some(el.unit.clone()),
            target: Some(el.target.clone()),
            message,
        };

        match el.class.as_str() {
            "point" => match el.prediction.get("value").and_then(number) {
                Some(v) => out.push(ComparableRecord::point(&el.unit, &el.target, v)),
                None => errors.push(err("point prediction has no finite numeric value".into())),
            },
            "quantile" => {
                let qs = el.prediction.get("quantile").and_then(Value::as_array);
                let vs = el.prediction.get("value").and_then(Value::as_array);
                let (Some(qs), Some(vs)) = (qs, vs) else {
                    errors.push(err("quantile prediction needs 'quantile' and 'value' lists".into()));
                    continue;
                };
                if qs.len() != vs.len() {
                    errors.push(err(format!(
                        "quantile prediction has {} quantiles but {} values",
                        qs.len(),
                        vs.len()
                    )));
                    continue;
                }
                let pairs: Option<Vec<(f64, f64)>> = qs
                    .iter()
                    .zip(vs)
                    .map(|(q, v)| Some((number(q)?, number(v)?)))
                    .collect();
                match pairs {
                    Some(pairs) => out.extend(
                        pairs
                            .into_iter()
                            .map(|(q, v)| ComparableRecord::quantile(&el.unit, &el.target, q, v)),
                    ),
                    None => errors.push(err("quantile prediction has a non-numeric entry".into())),
                }
            }
            other => errors.push(err(format!("unsupported prediction class '{other}'"))),
        }
    }

    (out, errors)
}

/// Finite number, accepting numeric strings as some exports quote them.
fn number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(predictions: Value) -> PredictionDoc {
        serde_json::from_value(json!({ "meta": {}, "predictions": predictions })).unwrap()
    }

    #[test]
    fn point_and_quantile_are_flattened() {
        let d = doc(json!([
            { "unit": "01", "target": "1 wk ahead cum death", "class": "point",
              "prediction": { "value": 12 } },
            { "unit": "01", "target": "1 wk ahead cum death", "class": "quantile",
              "prediction": { "quantile": [0.025, 0.5], "value": [8, 12.5] } }
        ]));
        let (records, errors) = expand(&d);
        assert!(errors.is_empty());
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], ComparableRecord::point("01", "1 wk ahead cum death", 12.0));
        assert_eq!(
            records[2],
            ComparableRecord::quantile("01", "1 wk ahead cum death", 0.5, 12.5)
        );
    }

    #[test]
    fn numeric_unit_is_accepted_as_text() {
        let d = doc(json!([
            { "unit": 6, "target": "t", "class": "point", "prediction": { "value": 1 } }
        ]));
        assert_eq!(d.predictions[0].unit, "6");
    }

    #[test]
    fn mismatched_quantile_lengths_are_reported() {
        let d = doc(json!([
            { "unit": "01", "target": "t", "class": "quantile",
              "prediction": { "quantile": [0.1, 0.5], "value": [1] } }
        ]));
        let (records, errors) = expand(&d);
        assert!(records.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("2 quantiles but 1 values"));
    }

    #[test]
    fn unsupported_class_is_reported_not_fatal() {
        let d = doc(json!([
            { "unit": "01", "target": "t", "class": "bin",
              "prediction": { "cat": ["a"], "prob": [1.0] } },
            { "unit": "02", "target": "t", "class": "point", "prediction": { "value": 2 } }
        ]));
        let (records, errors) = expand(&d);
        assert_eq!(records.len(), 1);
        assert_eq!(errors[0].row, Some(1));
        assert!(errors[0].message.contains("'bin'"));
    }

    #[test]
    fn missing_predictions_key_is_empty() {
        let d: PredictionDoc = serde_json::from_value(json!({ "meta": {} })).unwrap();
        assert!(d.predictions.is_empty());
    }
}
