// Error taxonomy for the API. Every handler returns AppResult and the
// IntoResponse impl in response.rs turns failures into JSON bodies.
use thiserror::Error;

pub mod classifier;
pub mod response;
pub mod store;

pub use classifier::ClassifierError;
pub use store::{StoreError, StoreResult};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid Username")]
    UnknownUser,

    #[error("Invalid Password")]
    WrongPassword,

    #[error("You are out of tokens, please refill")]
    TokensExhausted,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream call timed out after {0} seconds")]
    UpstreamTimeout(u64),

    #[error("Invalid Admin Password")]
    UnauthorizedAdmin,

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    // The #[from] attribute lets `?` lift store failures straight into an AppError.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ClassifierError> for AppError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::Timeout(secs) => AppError::UpstreamTimeout(secs),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
