use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Model server request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model server response was malformed: {0}")]
    MalformedResponse(String),

    #[error("Label index error: {0}")]
    Labels(String),

    #[error("Classification timed out after {0} seconds")]
    Timeout(u64),
}
