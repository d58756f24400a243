use std::sync::Arc;
use crate::errors::{AppError, AppResult};
use crate::models::{Account, AccountSummary};
use super::credentials::hash_password;
use super::store::{AccountStore, InsertOutcome};

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    initial_tokens: i64,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, initial_tokens: i64, bcrypt_cost: u32) -> Self {
        Self { store, initial_tokens, bcrypt_cost }
    }

    pub async fn register(&self, username: &str, password: &str) -> AppResult<AccountSummary> {
        if username.trim().is_empty() {
            return Err(AppError::InvalidInput("Username must not be empty".into()));
        }
        if password.is_empty() {
            return Err(AppError::InvalidInput("Password must not be empty".into()));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let account = Account::new(username, password_hash, self.initial_tokens);

        // Uniqueness is decided by the store, not by a prior lookup
        match self.store.insert_if_absent(&account).await? {
            InsertOutcome::Inserted => {
                tracing::info!("Registered user {} with {} tokens", username, self.initial_tokens);
                Ok(account.summary())
            }
            InsertOutcome::AlreadyExists => {
                tracing::info!("Registration refused, {} already exists", username);
                Err(AppError::DuplicateUsername(username.to_string()))
            }
        }
    }

    pub async fn list_users(&self) -> AppResult<Vec<AccountSummary>> {
        Ok(self.store.list_all().await?)
    }
}
