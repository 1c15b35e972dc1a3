// src/storage/encrypted/store.rs
use super::{
    cipher::{KdfParams, RecordCipher},
    errors::*,
    locks::KeyLocks,
    metadata::StoreMetadata,
    paths::{RecordPaths, DEFAULT_DIRECTORY},
};
use crate::storage::traits::ContextStore;
use crate::storage::types::{merge_fields, record_id, Record, DEFAULT_ID_FIELD};
use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub directory: PathBuf,
    pub id_field: String,
    /// Only used when the directory holds no store yet.
    pub kdf: KdfParams,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            id_field: DEFAULT_ID_FIELD.to_string(),
            kdf: KdfParams::default(),
        }
    }
}

impl StoreOptions {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }
}

/// Encrypted record store: one `<id>.data` file per record.
///
/// Operations on the same id are serialised, so an `update` never loses
/// fields to a concurrent `update`, `put` or `delete` of that id. Different
/// ids proceed independently.
#[derive(Debug)]
pub struct RecordStore {
    paths: RecordPaths,
    cipher: RecordCipher,
    id_field: String,
    locks: KeyLocks,
}

impl RecordStore {
    pub async fn new<P: AsRef<Path>>(passphrase: &str, directory: P) -> Result<Self> {
        Self::with_options(passphrase, StoreOptions::new(directory)).await
    }

    pub async fn with_options(passphrase: &str, options: StoreOptions) -> Result<Self> {
        if options.id_field.is_empty() {
            return Err(StorageError::InvalidRecord(
                "identifying field name must not be empty".to_string(),
            ));
        }

        // Fails if the path exists as something other than a directory
        fs::create_dir_all(&options.directory).await?;

        let metadata = StoreMetadata::load_or_create(&options.directory, options.kdf).await?;
        let salt = metadata.salt_bytes()?;
        let passphrase = Zeroizing::new(passphrase.to_string());
        let kdf = metadata.kdf;

        // scrypt blocks for a while; keep it off the async workers
        let cipher = tokio::task::spawn_blocking(move || {
            RecordCipher::with_params(&passphrase, &salt, kdf)
        })
        .await
        .map_err(|e| StorageError::KeyError(format!("key derivation task failed: {}", e)))??;

        info!(
            directory = %options.directory.display(),
            id_field = %options.id_field,
            "Opened encrypted record store"
        );

        Ok(Self {
            paths: RecordPaths::new(&options.directory),
            cipher,
            id_field: options.id_field,
            locks: KeyLocks::new(),
        })
    }

    pub fn directory(&self) -> &Path {
        self.paths.root()
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        self.paths.record(id)
    }

    pub async fn get(&self, id: &str) -> Result<Record> {
        self.read_record(id).await
    }

    pub async fn put(&self, record: Record) -> Result<Record> {
        let id = record_id(&record, &self.id_field)
            .ok_or_else(|| {
                StorageError::InvalidRecord(format!(
                    "missing string field {:?}",
                    self.id_field
                ))
            })?
            .to_string();
        self.paths.record(&id)?;

        let _guard = self.locks.lock(&id).await;
        self.write_record(&id, &record).await?;

        Ok(record)
    }

    pub async fn update(&self, id: &str, partial: Record) -> Result<Record> {
        self.paths.record(id)?;
        if let Some(value) = partial.get(&self.id_field) {
            if value.as_str() != Some(id) {
                return Err(StorageError::InvalidRecord(format!(
                    "field {:?} does not match record id {:?}",
                    self.id_field, id
                )));
            }
        }

        let _guard = self.locks.lock(id).await;

        let mut record = self.read_record(id).await?;
        let created = record.is_empty();
        merge_fields(&mut record, partial);
        // The file name is the source of truth for the id
        record.insert(self.id_field.clone(), Value::String(id.to_string()));

        self.write_record(id, &record).await?;
        debug!(id = %id, created, "Record updated");

        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = self.paths.record(id)?;
        let _guard = self.locks.lock(id).await;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(id = %id, "Record deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_record(&self, id: &str) -> Result<Record> {
        let path = self.paths.record(id)?;

        // Read directly: a missing file is an empty record, no stat beforehand
        let contents = match fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(id = %id, "No record on disk");
                return Ok(Record::new());
            }
            Err(e) => return Err(e.into()),
        };

        self.decode(id, &contents).map_err(|e| {
            warn!(id = %id, error = %e, "Stored record could not be read back");
            StorageError::CorruptRecord {
                id: id.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn decode(&self, id: &str, contents: &[u8]) -> Result<Record> {
        let text = std::str::from_utf8(contents)
            .map_err(|e| StorageError::MalformedBlob(format!("file is not text: {}", e)))?;
        let plaintext = Zeroizing::new(self.cipher.decrypt_str(text)?);

        let record: Record = serde_json::from_str(&plaintext)
            .map_err(|e| StorageError::InvalidFormat(format!("not a JSON object: {}", e)))?;

        debug!(id = %id, fields = record.len(), "Record read");
        Ok(record)
    }

    async fn write_record(&self, id: &str, record: &Record) -> Result<()> {
        // Serialize and encrypt
        let serialized = Zeroizing::new(
            serde_json::to_string(record).map_err(|e| StorageError::InvalidFormat(e.to_string()))?,
        );
        let blob = self.cipher.encrypt_to_string(&serialized)?;

        let target = self.paths.record(id)?;
        let temp = self.paths.temp_record(id)?;

        // Write the new contents beside the target, then swap it in
        let written = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(blob.as_bytes()).await?;
            file.sync_all().await?;
            fs::rename(&temp, &target).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %temp.display(), error = %cleanup, "Failed to remove temp file");
                }
            }
            return Err(e.into());
        }

        debug!(id = %id, bytes = blob.len(), "Record written");
        Ok(())
    }
}

#[async_trait]
impl ContextStore for RecordStore {
    async fn get(&self, id: &str) -> Result<Record> {
        RecordStore::get(self, id).await
    }

    async fn put(&self, record: Record) -> Result<Record> {
        RecordStore::put(self, record).await
    }

    async fn update(&self, id: &str, partial: Record) -> Result<Record> {
        RecordStore::update(self, id, partial).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        RecordStore::delete(self, id).await
    }
}
