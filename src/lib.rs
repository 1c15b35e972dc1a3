pub mod cli;
pub mod storage;
pub mod utils;

use tracing::info;

use crate::{
    storage::{encrypted::RecordStore, ContextStore},
    utils::{config::Config, error::Result},
};

pub struct Application {
    storage: RecordStore,
}

impl Application {
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing storage...");
        let storage =
            RecordStore::with_options(&config.storage.passphrase, config.storage_options()).await?;

        Ok(Self { storage })
    }

    pub fn context_store(&self) -> &dyn ContextStore {
        &self.storage
    }
}
