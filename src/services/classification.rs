use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use crate::errors::{AppError, AppResult};
use crate::models::{MeterOutcome, Prediction};
use super::classifier::Classifier;
use super::credentials::CredentialGate;
use super::imaging::{normalize, ImageFetcher};
use super::meter::TokenMeter;

/// Where the image for a metered classification comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Url(Option<String>),
    Upload(Option<Bytes>),
}

#[derive(Debug, Clone)]
pub struct ClassificationOutput {
    pub predictions: Vec<Prediction>,
    pub remaining_tokens: i64,
}

/// Runs the metered classify sequence. A token is only spent once the
/// classifier has answered; every earlier failure leaves the balance alone.
#[derive(Clone)]
pub struct ClassificationService {
    gate: CredentialGate,
    meter: TokenMeter,
    fetcher: ImageFetcher,
    classifier: Arc<dyn Classifier>,
    input_size: u32,
    classify_timeout: Duration,
}

impl ClassificationService {
    pub fn new(
        gate: CredentialGate,
        meter: TokenMeter,
        fetcher: ImageFetcher,
        classifier: Arc<dyn Classifier>,
        input_size: u32,
        classify_timeout: Duration,
    ) -> Self {
        Self { gate, meter, fetcher, classifier, input_size, classify_timeout }
    }

    pub async fn classify(
        &self,
        username: &str,
        password: &str,
        source: ImageSource,
    ) -> AppResult<ClassificationOutput> {
        self.gate.authenticate(username, password).await?;

        if self.meter.check(username).await? == MeterOutcome::Exhausted {
            return Err(AppError::TokensExhausted);
        }

        let raw = self.acquire(source).await?;
        let size = self.input_size;
        let image = tokio::task::spawn_blocking(move || normalize(&raw, size))
            .await
            .map_err(|e| AppError::Internal(format!("Image decoding task failed: {}", e)))??;

        let predictions = tokio::time::timeout(self.classify_timeout, self.classifier.classify(&image))
            .await
            .map_err(|_| {
                tracing::warn!("Classifier did not answer within {:?}", self.classify_timeout);
                AppError::UpstreamTimeout(self.classify_timeout.as_secs())
            })??;

        // A concurrent request may have spent the last token since the check;
        // the conditional decrement decides and the result is then discarded.
        let remaining_tokens = self.meter.consume(username).await?;

        tracing::info!(
            "Classified image for {} ({} labels, {} tokens left)",
            username,
            predictions.len(),
            remaining_tokens
        );
        Ok(ClassificationOutput { predictions, remaining_tokens })
    }

    async fn acquire(&self, source: ImageSource) -> AppResult<Bytes> {
        match source {
            ImageSource::Url(Some(url)) => self.fetcher.fetch(&url).await,
            ImageSource::Url(None) => Err(AppError::InvalidInput("No url provided".into())),
            ImageSource::Upload(Some(bytes)) if !bytes.is_empty() => Ok(bytes),
            ImageSource::Upload(Some(_)) => Err(AppError::InvalidInput("Uploaded image is empty".into())),
            ImageSource::Upload(None) => Err(AppError::InvalidInput("No image file provided".into())),
        }
    }
}
