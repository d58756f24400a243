use thiserror::Error;
use redis::RedisError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Token balance overflow for {username}")]
    Overflow { username: String },

    #[error("Corrupt account record for {username}: {reason}")]
    CorruptRecord { username: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
