use crate::storage::encrypted::{KdfParams, StoreOptions, DEFAULT_DIRECTORY};
use crate::storage::types::DEFAULT_ID_FIELD;
use crate::utils::error::{AppError, Result};
use config::{Config as ConfigLib, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "CONTEXT_VAULT";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub directory: String,
    pub passphrase: String,
    pub id_field: String,
    pub kdf: KdfParams,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    /// Also write daily-rotated log files here when set.
    pub directory: Option<String>,
}

impl Config {
    /// Defaults, then `config/default` and `config/local` (or `path` when
    /// given), then `CONTEXT_VAULT_*` environment variables with `__`
    /// between nested keys, e.g. `CONTEXT_VAULT_STORAGE__PASSPHRASE`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let kdf = KdfParams::default();

        let mut builder = ConfigLib::builder()
            // Start with default values
            .set_default("storage.directory", DEFAULT_DIRECTORY)?
            .set_default("storage.passphrase", "")?
            .set_default("storage.id_field", DEFAULT_ID_FIELD)?
            .set_default("storage.kdf.log_n", i64::from(kdf.log_n))?
            .set_default("storage.kdf.r", i64::from(kdf.r))?
            .set_default("storage.kdf.p", i64::from(kdf.p))?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name("config/local").required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.storage.passphrase.is_empty() {
            return Err(AppError::Config(format!(
                "storage.passphrase must be set (e.g. {}_STORAGE__PASSPHRASE)",
                ENV_PREFIX
            )));
        }
        if self.storage.directory.is_empty() {
            return Err(AppError::Config("storage.directory must not be empty".into()));
        }
        if self.storage.id_field.is_empty() {
            return Err(AppError::Config("storage.id_field must not be empty".into()));
        }

        Ok(())
    }

    pub fn storage_options(&self) -> StoreOptions {
        StoreOptions::new(PathBuf::from(&self.storage.directory))
            .id_field(self.storage.id_field.clone())
            .kdf(self.storage.kdf)
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}
