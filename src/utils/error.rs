// src/utils/error.rs
use crate::storage::encrypted::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Invalid input: {0}")]
    Input(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
