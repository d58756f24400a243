use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One ranked classifier answer. `confidence` is a percentage in [0, 100].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

/// Renders predictions as `{label: confidence, ...}` keeping rank order.
/// A repeated label keeps its first (highest) confidence.
pub fn predictions_to_json(predictions: &[Prediction]) -> Value {
    let mut map = Map::new();
    for prediction in predictions {
        if !map.contains_key(&prediction.label) {
            map.insert(prediction.label.clone(), Value::from(prediction.confidence));
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keeps_rank_order() {
        let predictions = vec![
            Prediction { label: "zebra".into(), confidence: 91.5 },
            Prediction { label: "hartebeest".into(), confidence: 4.0 },
            Prediction { label: "impala".into(), confidence: 1.25 },
        ];
        let rendered = serde_json::to_string(&predictions_to_json(&predictions)).unwrap();
        assert_eq!(rendered, r#"{"zebra":91.5,"hartebeest":4.0,"impala":1.25}"#);
    }

    #[test]
    fn repeated_label_keeps_highest_rank() {
        let predictions = vec![
            Prediction { label: "crane".into(), confidence: 60.0 },
            Prediction { label: "crane".into(), confidence: 30.0 },
        ];
        let json = predictions_to_json(&predictions);
        assert_eq!(json["crane"], 60.0);
        assert_eq!(json.as_object().unwrap().len(), 1);
    }
}
