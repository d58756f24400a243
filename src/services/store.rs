use async_trait::async_trait;
use crate::errors::StoreResult;
use crate::models::{Account, AccountSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// Balance was positive and is now the contained value.
    Decremented(i64),
    Exhausted,
    UnknownUser,
}

/// Persistence port for accounts.
///
/// Implementations must make `insert_if_absent`, `decrement_if_positive` and
/// `increment` single atomic steps: handlers may run in several processes
/// against the same backend, so no caller-side locking is relied upon.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>>;

    async fn insert_if_absent(&self, account: &Account) -> StoreResult<InsertOutcome>;

    async fn decrement_if_positive(&self, username: &str) -> StoreResult<DecrementOutcome>;

    /// Adds `amount` to the balance. `None` when the account does not exist.
    async fn increment(&self, username: &str, amount: i64) -> StoreResult<Option<i64>>;

    /// All accounts, ordered by username.
    async fn list_all(&self) -> StoreResult<Vec<AccountSummary>>;
}
