mod account;
mod classify;
mod extract;

pub use account::{handle_register, handle_refill, list_users, health};
pub use classify::{classify_url, classify_upload, TOKENS_REMAINING_HEADER};
pub use extract::AppJson;
