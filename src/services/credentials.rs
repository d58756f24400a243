use bcrypt::{hash, verify};
use std::sync::Arc;
use crate::errors::{AppError, AppResult};
use crate::models::CredentialOutcome;
use super::store::AccountStore;

/// Salted one-way hash of `password`. bcrypt is CPU bound, so this runs on
/// the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash(password.as_bytes(), cost))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks a (username, password) pair against the account store.
#[derive(Clone)]
pub struct CredentialGate {
    store: Arc<dyn AccountStore>,
}

impl CredentialGate {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    pub async fn verify(&self, username: &str, password: &str) -> AppResult<CredentialOutcome> {
        let account = match self.store.find_by_username(username).await? {
            Some(account) => account,
            None => return Ok(CredentialOutcome::UnknownUser),
        };

        let password = password.to_owned();
        let stored_hash = account.password_hash;
        let matched = tokio::task::spawn_blocking(move || verify(password.as_bytes(), &stored_hash))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?;

        match matched {
            Ok(true) => Ok(CredentialOutcome::Valid),
            Ok(false) => Ok(CredentialOutcome::WrongPassword),
            Err(e) => {
                tracing::error!("Stored password hash for {} is unusable: {}", username, e);
                Ok(CredentialOutcome::WrongPassword)
            }
        }
    }

    /// Like `verify`, but anything other than `Valid` becomes an error.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<()> {
        match self.verify(username, password).await? {
            CredentialOutcome::Valid => Ok(()),
            CredentialOutcome::UnknownUser => {
                tracing::info!("Rejected credentials: unknown user {}", username);
                Err(AppError::UnknownUser)
            }
            CredentialOutcome::WrongPassword => {
                tracing::info!("Rejected credentials: wrong password for {}", username);
                Err(AppError::WrongPassword)
            }
        }
    }
}
