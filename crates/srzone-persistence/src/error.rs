//! Persistence error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
