// src/storage/encrypted/blob.rs
use super::errors::*;
use std::fmt;

/// Separator between the ciphertext and IV hex segments. Hex output never
/// contains it, so no escaping is needed.
pub const BLOB_DELIMITER: char = '|';

/// Text form of one encrypted record: `hex(ciphertext)|hex(iv)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherBlob {
    ciphertext: Vec<u8>,
    iv: Vec<u8>,
}

impl CipherBlob {
    pub fn new(ciphertext: Vec<u8>, iv: Vec<u8>) -> Self {
        Self { ciphertext, iv }
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Parse the on-disk text form. Trailing whitespace (a newline left by an
    /// editor, say) is ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim_end();

        let (ciphertext_hex, iv_hex) = text.split_once(BLOB_DELIMITER).ok_or_else(|| {
            StorageError::MalformedBlob("delimiter not found".to_string())
        })?;

        if iv_hex.is_empty() {
            return Err(StorageError::MalformedBlob("IV not found".to_string()));
        }

        let iv = hex::decode(iv_hex)
            .map_err(|e| StorageError::MalformedBlob(format!("invalid IV encoding: {}", e)))?;
        let ciphertext = hex::decode(ciphertext_hex).map_err(|e| {
            StorageError::MalformedBlob(format!("invalid ciphertext encoding: {}", e))
        })?;

        Ok(Self { ciphertext, iv })
    }
}

impl fmt::Display for CipherBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            hex::encode(&self.ciphertext),
            BLOB_DELIMITER,
            hex::encode(&self.iv)
        )
    }
}
