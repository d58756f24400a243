use std::sync::Arc;
use std::time::Duration;
use crate::config::Config;
use crate::services::{
    AccountService, AccountStore, AdminSecret, ClassificationService, Classifier,
    CredentialGate, ImageFetcher, TokenMeter,
};

/// Tunables that shape the services, separated from `Config` so tests can
/// build a state without configuration files.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub initial_tokens: i64,
    pub bcrypt_cost: u32,
    pub input_size: u32,
    pub classify_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            initial_tokens: 6,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            input_size: 299,
            classify_timeout: Duration::from_secs(30),
        }
    }
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_tokens: config.account.initial_tokens,
            bcrypt_cost: config.account.bcrypt_cost,
            input_size: config.classifier.input_size,
            classify_timeout: config.classifier.timeout(),
        }
    }
}

// Application state that is shared between handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub meter: TokenMeter,
    pub classification: ClassificationService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AccountStore>,
        classifier: Arc<dyn Classifier>,
        fetcher: ImageFetcher,
        admin_secret: AdminSecret,
        settings: ServiceSettings,
    ) -> Self {
        let gate = CredentialGate::new(store.clone());
        let meter = TokenMeter::new(store.clone(), admin_secret);
        let accounts = AccountService::new(store, settings.initial_tokens, settings.bcrypt_cost);
        let classification = ClassificationService::new(
            gate,
            meter.clone(),
            fetcher,
            classifier,
            settings.input_size,
            settings.classify_timeout,
        );

        Self { accounts, meter, classification }
    }
}
