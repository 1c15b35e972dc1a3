// src/storage/encrypted/metadata.rs
use super::{cipher::KdfParams, errors::*};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const METADATA_FILE: &str = ".vault.json";
pub const METADATA_VERSION: u32 = 1;
pub const SALT_LEN: usize = 16;

/// Per-store key derivation inputs, kept next to the records so every
/// directory derives its own key from the shared passphrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub version: u32,
    pub salt: String,
    pub kdf: KdfParams,
}

impl StoreMetadata {
    fn generate(kdf: KdfParams) -> Self {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        Self {
            version: METADATA_VERSION,
            salt: hex::encode(salt),
            kdf,
        }
    }

    pub fn path(directory: &Path) -> PathBuf {
        directory.join(METADATA_FILE)
    }

    pub fn salt_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.salt)
            .map_err(|e| StorageError::InvalidFormat(format!("store salt is not hex: {}", e)))
    }

    /// Read the metadata of an existing store, or create it with a fresh salt
    /// and `kdf` for a new one. Parameters of an existing store always win.
    pub async fn load_or_create(directory: &Path, kdf: KdfParams) -> Result<Self> {
        let path = Self::path(directory);

        match fs::read(&path).await {
            Ok(bytes) => Self::decode(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Self::create(directory, kdf).await,
            Err(e) => Err(e.into()),
        }
    }

    async fn create(directory: &Path, kdf: KdfParams) -> Result<Self> {
        let path = Self::path(directory);
        let temp = directory.join(format!("{}.{}.tmp", METADATA_FILE, Uuid::new_v4()));

        let metadata = Self::generate(kdf);
        let serialized =
            serde_json::to_vec(&metadata).map_err(|e| StorageError::InvalidFormat(e.to_string()))?;

        let written = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(&serialized).await?;
            file.sync_all().await?;
            // hard_link never replaces an existing target, so only one opener
            // claims the name and the file under it is always complete
            fs::hard_link(&temp, &path).await
        }
        .await;

        match fs::remove_file(&temp).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %temp.display(), error = %e, "Failed to remove temporary metadata file"),
        }

        match written {
            Ok(()) => {
                info!(path = %path.display(), "Initialised new store metadata");
                Ok(metadata)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Store metadata created concurrently, using it");
                Self::decode(&fs::read(&path).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let metadata: Self = serde_json::from_slice(bytes).map_err(|e| {
            StorageError::InvalidFormat(format!("unreadable store metadata: {}", e))
        })?;
        if metadata.version != METADATA_VERSION {
            return Err(StorageError::InvalidFormat(format!(
                "unsupported store metadata version {}",
                metadata.version
            )));
        }
        Ok(metadata)
    }
}
