use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, AsyncCommands, Client, Script};
use std::collections::HashMap;
use crate::errors::{StoreError, StoreResult};
use crate::models::{Account, AccountSummary};
use super::store::{AccountStore, DecrementOutcome, InsertOutcome};

const ACCOUNT_SET: &str = "accounts";

// KEYS[1] account hash, KEYS[2] username set
const INSERT_IF_ABSENT: &str = r#"
if redis.call("EXISTS", KEYS[1]) == 1 then
    return 0
end
redis.call("HSET", KEYS[1],
    "username", ARGV[1],
    "password_hash", ARGV[2],
    "tokens", ARGV[3],
    "created_at", ARGV[4])
redis.call("SADD", KEYS[2], ARGV[1])
return 1
"#;

// Returns the new balance, -1 when exhausted, -2 when the account is missing.
const DECREMENT_IF_POSITIVE: &str = r#"
local tokens = redis.call("HGET", KEYS[1], "tokens")
if not tokens then
    return -2
end
if tonumber(tokens) <= 0 then
    return -1
end
return redis.call("HINCRBY", KEYS[1], "tokens", -1)
"#;

const INCREMENT_EXISTING: &str = r#"
if redis.call("EXISTS", KEYS[1]) == 0 then
    return nil
end
return redis.call("HINCRBY", KEYS[1], "tokens", ARGV[1])
"#;

pub struct RedisService {
    manager: ConnectionManager,
    insert_script: Script,
    decrement_script: Script,
    increment_script: Script,
}

impl RedisService {
    pub async fn connect(client: Client) -> StoreResult<Self> {
        let manager = ConnectionManager::new(client).await?;
        Ok(Self {
            manager,
            insert_script: Script::new(INSERT_IF_ABSENT),
            decrement_script: Script::new(DECREMENT_IF_POSITIVE),
            increment_script: Script::new(INCREMENT_EXISTING),
        })
    }

    fn account_key(username: &str) -> String {
        format!("account:{}", username)
    }
}

// Rebuilds an Account from the fields stored by INSERT_IF_ABSENT.
fn account_from_fields(username: &str, mut fields: HashMap<String, String>) -> StoreResult<Account> {
    let corrupt = |reason: &str| StoreError::CorruptRecord {
        username: username.to_string(),
        reason: reason.to_string(),
    };

    let password_hash = fields
        .remove("password_hash")
        .ok_or_else(|| corrupt("missing password_hash"))?;
    let tokens = fields
        .get("tokens")
        .ok_or_else(|| corrupt("missing tokens"))?
        .parse::<i64>()
        .map_err(|_| corrupt("tokens is not an integer"))?;
    let created_at = match fields.get("created_at") {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|_| corrupt("created_at is not RFC 3339"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    Ok(Account {
        username: username.to_string(),
        password_hash,
        tokens,
        created_at,
    })
}

#[async_trait]
impl AccountStore for RedisService {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let mut conn = self.manager.clone();
        let fields: HashMap<String, String> = conn.hgetall(Self::account_key(username)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        account_from_fields(username, fields).map(Some)
    }

    async fn insert_if_absent(&self, account: &Account) -> StoreResult<InsertOutcome> {
        let mut conn = self.manager.clone();
        let inserted: i64 = self
            .insert_script
            .key(Self::account_key(&account.username))
            .key(ACCOUNT_SET)
            .arg(&account.username)
            .arg(&account.password_hash)
            .arg(account.tokens)
            .arg(account.created_at.to_rfc3339())
            .invoke_async(&mut conn)
            .await?;

        Ok(if inserted == 1 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::AlreadyExists
        })
    }

    async fn decrement_if_positive(&self, username: &str) -> StoreResult<DecrementOutcome> {
        let mut conn = self.manager.clone();
        let result: i64 = self
            .decrement_script
            .key(Self::account_key(username))
            .invoke_async(&mut conn)
            .await?;

        Ok(match result {
            -2 => DecrementOutcome::UnknownUser,
            -1 => DecrementOutcome::Exhausted,
            remaining => DecrementOutcome::Decremented(remaining),
        })
    }

    async fn increment(&self, username: &str, amount: i64) -> StoreResult<Option<i64>> {
        let mut conn = self.manager.clone();
        let balance: Option<i64> = self
            .increment_script
            .key(Self::account_key(username))
            .arg(amount)
            .invoke_async(&mut conn)
            .await?;
        Ok(balance)
    }

    async fn list_all(&self) -> StoreResult<Vec<AccountSummary>> {
        let mut conn = self.manager.clone();
        let mut usernames: Vec<String> = conn.smembers(ACCOUNT_SET).await?;
        usernames.sort();

        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for username in &usernames {
            pipe.hget(Self::account_key(username), "tokens");
        }
        let balances: Vec<Option<i64>> = pipe.query_async(&mut conn).await?;

        Ok(usernames
            .into_iter()
            .zip(balances)
            .filter_map(|(username, tokens)| {
                tokens.map(|tokens| AccountSummary { username, tokens })
            })
            .collect())
    }
}
