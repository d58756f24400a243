use serde::Deserialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub redis: RedisConfig,
    pub classifier: ClassifierConfig,
    pub fetch: FetchConfig,
    pub upload: UploadConfig,
    pub account: AccountConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub sentinel_enabled: bool,
    pub sentinel_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub labels_path: String,
    pub input_size: u32,  // square edge in pixels, 299 for Inception v3
    pub top_k: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_image_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,  // whole request body, in bytes
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
    pub initial_tokens: i64,
    pub bcrypt_cost: u32,
}

#[derive(Deserialize, Clone, Default)]
pub struct AdminConfig {
    pub secret: Option<String>,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("admin.secret must be set (APP__ADMIN__SECRET)")]
    MissingAdminSecret,

    #[error("classifier.top_k must be between 1 and 3, got {0}")]
    TopK(usize),

    #[error("classifier.input_size must be positive")]
    InputSize,

    #[error("{0} must be positive")]
    ZeroTimeout(&'static str),

    #[error("account.initial_tokens must not be negative, got {0}")]
    InitialTokens(i64),

    #[error("redis.sentinel_url is required when redis.sentinel_enabled is set")]
    MissingSentinelUrl,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        match self.admin.secret.as_deref() {
            Some(secret) if !secret.is_empty() => {}
            _ => return Err(ConfigValidationError::MissingAdminSecret),
        }
        if !(1..=3).contains(&self.classifier.top_k) {
            return Err(ConfigValidationError::TopK(self.classifier.top_k));
        }
        if self.classifier.input_size == 0 {
            return Err(ConfigValidationError::InputSize);
        }
        if self.classifier.timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroTimeout("classifier.timeout_secs"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroTimeout("fetch.timeout_secs"));
        }
        if self.account.initial_tokens < 0 {
            return Err(ConfigValidationError::InitialTokens(self.account.initial_tokens));
        }
        if self.redis.sentinel_enabled && self.redis.sentinel_url.is_none() {
            return Err(ConfigValidationError::MissingSentinelUrl);
        }
        Ok(())
    }

    /// Redis URL to connect to, honouring the sentinel switch.
    pub fn redis_url(&self) -> &str {
        match self.redis.sentinel_url.as_deref() {
            Some(url) if self.redis.sentinel_enabled => url,
            _ => &self.redis.url,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
