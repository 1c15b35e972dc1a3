//! Encrypted, file-backed storage for per-app context records.
//!
//! Each record lives in `<directory>/<id>.data` as a single line of
//! `hex(ciphertext)|hex(iv)`, encrypted with AES-256-GCM under a key derived
//! from the store passphrase and a per-directory salt.

pub mod encrypted;
pub mod traits;
pub mod types;

pub use encrypted::{RecordStore, StorageError, StoreOptions};
pub use traits::ContextStore;
pub use types::Record;
