#![allow(dead_code)]

use async_trait::async_trait;
use axum_classify::errors::ClassifierError;
use axum_classify::models::Prediction;
use axum_classify::services::{
    AccountStore, AdminSecret, Classifier, ImageFetcher, InMemoryStore, NormalizedImage,
};
use axum_classify::{AppState, ServiceSettings};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const ADMIN_SECRET: &str = "test-admin-secret";

#[derive(Clone, Copy)]
pub enum StubBehaviour {
    Succeed,
    Fail,
    Hang,
}

/// Classifier double that counts calls and answers with fixed labels.
pub struct StubClassifier {
    calls: AtomicUsize,
    behaviour: StubBehaviour,
}

impl StubClassifier {
    pub fn new(behaviour: StubBehaviour) -> Self {
        Self { calls: AtomicUsize::new(0), behaviour }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, image: &NormalizedImage) -> Result<Vec<Prediction>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(image.pixels.len(), (image.size * image.size * 3) as usize);

        match self.behaviour {
            StubBehaviour::Succeed => Ok(vec![
                Prediction { label: "tabby".into(), confidence: 81.25 },
                Prediction { label: "tiger_cat".into(), confidence: 12.5 },
                Prediction { label: "Egyptian_cat".into(), confidence: 3.0 },
            ]),
            StubBehaviour::Fail => Err(ClassifierError::MalformedResponse("stub failure".into())),
            StubBehaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Vec::new())
            }
        }
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub classifier: Arc<StubClassifier>,
}

impl TestApp {
    pub fn new(behaviour: StubBehaviour) -> Self {
        Self::with_settings(behaviour, settings())
    }

    pub fn with_settings(behaviour: StubBehaviour, settings: ServiceSettings) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let classifier = Arc::new(StubClassifier::new(behaviour));
        let fetcher = ImageFetcher::new(Duration::from_secs(5), 1024 * 1024).unwrap();
        let state = AppState::new(
            store.clone(),
            classifier.clone(),
            fetcher,
            AdminSecret::new(ADMIN_SECRET),
            settings,
        );
        Self { state, store, classifier }
    }

    pub async fn register(&self, username: &str, password: &str) {
        self.state.accounts.register(username, password).await.unwrap();
    }

    pub async fn tokens(&self, username: &str) -> i64 {
        self.store
            .find_by_username(username)
            .await
            .unwrap()
            .expect("account exists")
            .tokens
    }
}

/// Fast hashing and a tiny model input keep the tests quick.
pub fn settings() -> ServiceSettings {
    ServiceSettings {
        initial_tokens: 6,
        bcrypt_cost: 4,
        input_size: 8,
        classify_timeout: Duration::from_secs(5),
    }
}

pub fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(16, 12, Rgb([200, 120, 40]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}
