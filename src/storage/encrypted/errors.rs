// src/storage/encrypted/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Corrupt record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Decryption error: {0}")]
    DecryptionError(String),

    #[error("Malformed cipher blob: {0}")]
    MalformedBlob(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid record id {id:?}: {reason}")]
    InvalidId { id: String, reason: &'static str },

    #[error("Key management error: {0}")]
    KeyError(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
