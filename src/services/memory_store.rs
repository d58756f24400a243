use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use crate::errors::{StoreError, StoreResult};
use crate::models::{Account, AccountSummary};
use super::store::{AccountStore, DecrementOutcome, InsertOutcome};

/// Process-local account store. Every mutation happens under the write lock,
/// which gives the same atomicity the Redis scripts provide.
#[derive(Default)]
pub struct InMemoryStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        Ok(self.accounts.read().await.get(username).cloned())
    }

    async fn insert_if_absent(&self, account: &Account) -> StoreResult<InsertOutcome> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.username) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        accounts.insert(account.username.clone(), account.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn decrement_if_positive(&self, username: &str) -> StoreResult<DecrementOutcome> {
        let mut accounts = self.accounts.write().await;
        Ok(match accounts.get_mut(username) {
            None => DecrementOutcome::UnknownUser,
            Some(account) if account.tokens <= 0 => DecrementOutcome::Exhausted,
            Some(account) => {
                account.tokens -= 1;
                DecrementOutcome::Decremented(account.tokens)
            }
        })
    }

    async fn increment(&self, username: &str, amount: i64) -> StoreResult<Option<i64>> {
        let mut accounts = self.accounts.write().await;
        let account = match accounts.get_mut(username) {
            Some(account) => account,
            None => return Ok(None),
        };
        // Mirrors HINCRBY, which refuses to overflow
        account.tokens = account
            .tokens
            .checked_add(amount)
            .ok_or_else(|| StoreError::Overflow { username: username.to_string() })?;
        Ok(Some(account.tokens))
    }

    async fn list_all(&self) -> StoreResult<Vec<AccountSummary>> {
        let accounts = self.accounts.read().await;
        let mut summaries: Vec<AccountSummary> = accounts.values().map(Account::summary).collect();
        summaries.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(summaries)
    }
}
