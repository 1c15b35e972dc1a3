// src/storage/encrypted/cipher.rs
use super::{blob::CipherBlob, errors::*};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 12;

/// scrypt cost parameters. The defaults match the usual interactive-login
/// settings (N = 2^14, r = 8, p = 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub log_n: u8,
    pub r: u32,
    pub p: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            log_n: 14,
            r: 8,
            p: 1,
        }
    }
}

/// AES-256-GCM over UTF-8 documents, keyed from a passphrase.
pub struct RecordCipher {
    cipher: Aes256Gcm,
}

impl RecordCipher {
    pub fn new(passphrase: &str, salt: &[u8]) -> Result<Self> {
        Self::with_params(passphrase, salt, KdfParams::default())
    }

    pub fn with_params(passphrase: &str, salt: &[u8], params: KdfParams) -> Result<Self> {
        let key = derive_key(passphrase, salt, params)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));

        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<CipherBlob> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        let nonce = Nonce::from_slice(&iv);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| StorageError::EncryptionError(e.to_string()))?;

        Ok(CipherBlob::new(ciphertext, iv.to_vec()))
    }

    pub fn decrypt(&self, blob: &CipherBlob) -> Result<String> {
        if blob.iv().len() != IV_LEN {
            return Err(StorageError::MalformedBlob(format!(
                "IV must be {} bytes, got {}",
                IV_LEN,
                blob.iv().len()
            )));
        }
        let nonce = Nonce::from_slice(blob.iv());

        // aead::Error is opaque: wrong key and tampered ciphertext look the same
        let plaintext = self
            .cipher
            .decrypt(nonce, blob.ciphertext())
            .map_err(|_| {
                StorageError::DecryptionError(
                    "authentication failed (wrong key or corrupted data)".to_string(),
                )
            })?;

        String::from_utf8(plaintext)
            .map_err(|e| StorageError::DecryptionError(format!("plaintext is not UTF-8: {}", e)))
    }

    /// Encrypt straight to the on-disk text form.
    pub fn encrypt_to_string(&self, plaintext: &str) -> Result<String> {
        Ok(self.encrypt(plaintext)?.to_string())
    }

    /// Parse the on-disk text form and decrypt it.
    pub fn decrypt_str(&self, text: &str) -> Result<String> {
        let blob = CipherBlob::parse(text)?;
        self.decrypt(&blob)
    }
}

impl fmt::Debug for RecordCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordCipher")
            .field("algorithm", &"AES-256-GCM")
            .finish_non_exhaustive()
    }
}

fn derive_key(passphrase: &str, salt: &[u8], params: KdfParams) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if passphrase.is_empty() {
        return Err(StorageError::KeyError("passphrase must not be empty".to_string()));
    }

    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_LEN)
        .map_err(|e| StorageError::KeyError(format!("invalid scrypt parameters: {}", e)))?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(passphrase.as_bytes(), salt, &scrypt_params, key.as_mut_slice())
        .map_err(|e| StorageError::KeyError(format!("key derivation failed: {}", e)))?;

    Ok(key)
}
