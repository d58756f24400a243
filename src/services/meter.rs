use std::sync::Arc;
use subtle::ConstantTimeEq;
use crate::errors::{AppError, AppResult};
use crate::models::MeterOutcome;
use super::store::{AccountStore, DecrementOutcome};

/// Shared administrative secret guarding refills.
#[derive(Clone)]
pub struct AdminSecret(Arc<str>);

impl AdminSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        let secret: String = secret.into();
        Self(Arc::from(secret))
    }

    /// Constant-time comparison; length mismatch also compares unequal.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret(<redacted>)")
    }
}

/// Per-account token balance guarding metered operations.
#[derive(Clone)]
pub struct TokenMeter {
    store: Arc<dyn AccountStore>,
    admin_secret: AdminSecret,
}

impl TokenMeter {
    pub fn new(store: Arc<dyn AccountStore>, admin_secret: AdminSecret) -> Self {
        Self { store, admin_secret }
    }

    /// Read-only balance check. Nothing is reserved in storage; the atomic
    /// decrement in `consume` is what enforces the limit.
    pub async fn check(&self, username: &str) -> AppResult<MeterOutcome> {
        let account = self
            .store
            .find_by_username(username)
            .await?
            .ok_or(AppError::UnknownUser)?;

        if account.tokens <= 0 {
            tracing::info!("User {} is out of tokens", username);
            return Ok(MeterOutcome::Exhausted);
        }
        tracing::debug!("User {} has {} tokens", username, account.tokens);
        Ok(MeterOutcome::Allowed)
    }

    /// Spends one token and returns the remaining balance.
    pub async fn consume(&self, username: &str) -> AppResult<i64> {
        match self.store.decrement_if_positive(username).await? {
            DecrementOutcome::Decremented(remaining) => {
                tracing::debug!("User {} spent a token, {} left", username, remaining);
                Ok(remaining)
            }
            DecrementOutcome::Exhausted => {
                tracing::info!("User {} ran out of tokens before the decrement", username);
                Err(AppError::TokensExhausted)
            }
            DecrementOutcome::UnknownUser => Err(AppError::UnknownUser),
        }
    }

    /// Adds `amount` tokens and returns the new balance.
    pub async fn refill(&self, username: &str, admin_secret: &str, amount: i64) -> AppResult<i64> {
        if !self.admin_secret.matches(admin_secret) {
            tracing::warn!("Refill for {} rejected: bad admin secret", username);
            return Err(AppError::UnauthorizedAdmin);
        }
        if amount <= 0 {
            return Err(AppError::InvalidInput(format!(
                "Refill amount must be positive, got {}",
                amount
            )));
        }

        let balance = self
            .store
            .increment(username, amount)
            .await?
            .ok_or(AppError::UnknownUser)?;

        tracing::info!("Refilled {} tokens for {}, balance now {}", amount, username, balance);
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Account;
    use crate::services::InMemoryStore;

    async fn meter_with(username: &str, tokens: i64) -> (TokenMeter, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_if_absent(&Account::new(username, "hash", tokens))
            .await
            .unwrap();
        (TokenMeter::new(store.clone(), AdminSecret::new("abc123")), store)
    }

    async fn balance(store: &InMemoryStore, username: &str) -> i64 {
        store.find_by_username(username).await.unwrap().unwrap().tokens
    }

    #[test]
    fn admin_secret_comparison() {
        let secret = AdminSecret::new("abc123");
        assert!(secret.matches("abc123"));
        assert!(!secret.matches("abc12"));
        assert!(!secret.matches("abc1234"));
        assert!(!secret.matches(""));
        assert_eq!(format!("{:?}", secret), "AdminSecret(<redacted>)");
    }

    #[tokio::test]
    async fn check_does_not_mutate() {
        let (meter, store) = meter_with("alice", 1).await;
        assert_eq!(meter.check("alice").await.unwrap(), MeterOutcome::Allowed);
        assert_eq!(meter.check("alice").await.unwrap(), MeterOutcome::Allowed);
        assert_eq!(balance(&store, "alice").await, 1);
    }

    #[tokio::test]
    async fn zero_balance_is_exhausted() {
        let (meter, _) = meter_with("bob", 0).await;
        assert_eq!(meter.check("bob").await.unwrap(), MeterOutcome::Exhausted);
        assert!(matches!(meter.consume("bob").await, Err(AppError::TokensExhausted)));
    }

    #[tokio::test]
    async fn refill_adds_to_current_balance() {
        let (meter, store) = meter_with("carol", 2).await;
        assert_eq!(meter.refill("carol", "abc123", 5).await.unwrap(), 7);
        assert_eq!(balance(&store, "carol").await, 7);
    }

    #[tokio::test]
    async fn refill_with_wrong_secret_changes_nothing() {
        let (meter, store) = meter_with("dave", 3).await;
        assert!(matches!(
            meter.refill("dave", "letmein", 100).await,
            Err(AppError::UnauthorizedAdmin)
        ));
        assert_eq!(balance(&store, "dave").await, 3);
    }

    #[tokio::test]
    async fn refill_rejects_non_positive_amounts_and_unknown_users() {
        let (meter, store) = meter_with("erin", 3).await;
        assert!(matches!(meter.refill("erin", "abc123", 0).await, Err(AppError::InvalidInput(_))));
        assert!(matches!(meter.refill("erin", "abc123", -4).await, Err(AppError::InvalidInput(_))));
        assert!(matches!(meter.refill("frank", "abc123", 4).await, Err(AppError::UnknownUser)));
        assert_eq!(balance(&store, "erin").await, 3);
    }
}
