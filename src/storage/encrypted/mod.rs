// src/storage/encrypted/mod.rs
mod blob;
mod cipher;
mod errors;
mod locks;
mod metadata;
mod paths;
mod store;

pub use blob::{CipherBlob, BLOB_DELIMITER};
pub use cipher::{KdfParams, RecordCipher};
pub use errors::{Result, StorageError};
pub use metadata::{StoreMetadata, METADATA_FILE};
pub use paths::{validate_id, RecordPaths, DEFAULT_DIRECTORY};
pub use store::{RecordStore, StoreOptions};
