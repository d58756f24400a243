mod accounts;
mod classification;
mod classifier;
mod credentials;
mod imaging;
mod memory_store;
mod meter;
mod redis_service;
mod store;

pub use accounts::AccountService;
pub use classification::{ClassificationOutput, ClassificationService, ImageSource};
pub use classifier::{top_predictions, Classifier, LabelIndex, RemoteClassifier};
pub use credentials::{hash_password, CredentialGate};
pub use imaging::{normalize, ImageFetcher, NormalizedImage};
pub use memory_store::InMemoryStore;
pub use meter::{AdminSecret, TokenMeter};
pub use redis_service::RedisService;
pub use store::{AccountStore, DecrementOutcome, InsertOutcome};
