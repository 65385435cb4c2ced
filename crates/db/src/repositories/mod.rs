use footprint_core::store::StoreError;
use thiserror::Error;

pub mod kv_store;

pub use kv_store::SqlKeyValueStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error under `{key}`: {message}")]
    Decode { key: String, message: String },
}

impl From<RepositoryError> for StoreError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Database(error) => StoreError::Backend(error.to_string()),
            RepositoryError::Decode { key, message } => StoreError::Decode { key, message },
        }
    }
}
