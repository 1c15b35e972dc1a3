// src/storage/traits.rs
use crate::storage::encrypted::Result;
use crate::storage::types::Record;
use async_trait::async_trait;

/// Keyed persistence for per-app context records.
///
/// `get` on an unknown id yields an empty record; every other missing-record
/// condition is an error.
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Record>;

    /// Store `record` in full under its identifying field and hand it back.
    async fn put(&self, record: Record) -> Result<Record>;

    /// Merge `partial` into the stored record field by field and return the
    /// merged result.
    async fn update(&self, id: &str, partial: Record) -> Result<Record>;

    async fn delete(&self, id: &str) -> Result<()>;
}
