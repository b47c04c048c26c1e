use std::error::Error as StdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Store file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported store type: {0}")]
    UnsupportedType(String),
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("Another message is still being analysed")]
    Busy,
    #[error("Generation request failed: {0}")]
    Generation(#[source] Box<dyn StdError + Send + Sync>),
}
