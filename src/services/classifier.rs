use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use crate::errors::ClassifierError;
use crate::models::Prediction;
use super::imaging::NormalizedImage;

/// Opaque image classifier: ranked labels with percentage confidences.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &NormalizedImage) -> Result<Vec<Prediction>, ClassifierError>;
}

/// Class id to human label, e.g. 207 -> "golden_retriever".
#[derive(Debug, Clone)]
pub struct LabelIndex {
    labels: Vec<String>,
}

impl LabelIndex {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Parses the Keras `imagenet_class_index.json` layout:
    /// `{"0": ["n01440764", "tench"], "1": [...], ...}`.
    pub fn from_class_index_json(raw: &str) -> Result<Self, ClassifierError> {
        let entries: HashMap<String, (String, String)> = serde_json::from_str(raw)
            .map_err(|e| ClassifierError::Labels(format!("Invalid class index JSON: {}", e)))?;

        let mut labels = vec![None; entries.len()];
        for (key, (_wnid, label)) in entries {
            let index: usize = key
                .parse()
                .map_err(|_| ClassifierError::Labels(format!("Class id '{}' is not a number", key)))?;
            let slot = labels
                .get_mut(index)
                .ok_or_else(|| ClassifierError::Labels(format!("Class id {} is out of range", index)))?;
            *slot = Some(label);
        }

        let labels = labels
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ClassifierError::Labels("Class ids are not contiguous".into()))?;
        Ok(Self { labels })
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            ClassifierError::Labels(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let index = Self::from_class_index_json(&raw)?;
        tracing::info!("Loaded {} class labels from {}", index.len(), path.display());
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }
}

/// Picks the `k` best scores and turns them into percentages.
///
/// A score vector one longer than the label index is assumed to carry a
/// leading background class, which is skipped.
pub fn top_predictions(
    scores: &[f32],
    labels: &LabelIndex,
    k: usize,
) -> Result<Vec<Prediction>, ClassifierError> {
    let offset = if scores.len() == labels.len() {
        0
    } else if scores.len() == labels.len() + 1 {
        1
    } else {
        return Err(ClassifierError::MalformedResponse(format!(
            "Expected {} scores, got {}",
            labels.len(),
            scores.len()
        )));
    };

    let mut ranked: Vec<(usize, f32)> = scores[offset..]
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| score.is_finite())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    Ok(ranked
        .into_iter()
        .take(k)
        .filter_map(|(index, score)| {
            labels.get(index).map(|label| Prediction {
                label: label.to_string(),
                confidence: (score as f64 * 100.0).clamp(0.0, 100.0),
            })
        })
        .collect())
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

/// Client for a TensorFlow-Serving style REST predict endpoint.
pub struct RemoteClassifier {
    client: Client,
    endpoint: String,
    labels: Arc<LabelIndex>,
    top_k: usize,
    timeout: Duration,
}

impl RemoteClassifier {
    pub fn new(
        endpoint: impl Into<String>,
        labels: LabelIndex,
        top_k: usize,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            labels: Arc::new(labels),
            top_k,
            timeout,
        })
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn classify(&self, image: &NormalizedImage) -> Result<Vec<Prediction>, ClassifierError> {
        let body = json!({ "instances": [image.to_nested()] });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout(self.timeout.as_secs())
                } else {
                    ClassifierError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status { status: status.as_u16(), body });
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;
        let scores = parsed
            .predictions
            .first()
            .ok_or_else(|| ClassifierError::MalformedResponse("Empty predictions".into()))?;

        let predictions = top_predictions(scores, &self.labels, self.top_k)?;
        tracing::debug!("Model returned {} predictions", predictions.len());
        Ok(predictions)
    }
}
