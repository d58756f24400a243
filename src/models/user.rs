use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Account {
    pub username: String,
    pub password_hash: String,  // bcrypt hash, salt embedded
    pub tokens: i64,            // classifications left
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>, tokens: i64) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            tokens,
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            username: self.username.clone(),
            tokens: self.tokens,
        }
    }
}

/// Public view of an account, as returned by `GET /users`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub username: String,
    pub tokens: i64,
}
