mod user;
mod forms;
mod outcome;
mod prediction;

pub use user::{Account, AccountSummary};
pub use forms::{RegisterRequest, ClassifyUrlRequest, RefillRequest};
pub use outcome::{CredentialOutcome, MeterOutcome};
pub use prediction::{Prediction, predictions_to_json};
