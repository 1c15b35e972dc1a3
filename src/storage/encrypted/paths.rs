// src/storage/encrypted/paths.rs
use super::errors::*;
use std::path::{Path, PathBuf};

pub const DEFAULT_DIRECTORY: &str = "data";
pub const RECORD_EXTENSION: &str = "data";

/// Longest accepted id, leaving room for the extension and temp-file
/// decorations within a 255-byte file name.
pub const MAX_ID_LEN: usize = 200;

/// Maps record ids to files inside the store directory.
#[derive(Debug, Clone)]
pub struct RecordPaths {
    root: PathBuf,
}

impl Default for RecordPaths {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTORY)
    }
}

impl RecordPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root/<id>.data`, after checking the id cannot escape `root`.
    pub fn record(&self, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self.root.join(format!("{}.{}", id, RECORD_EXTENSION)))
    }

    /// Unique sibling used for write-then-rename. The leading dot keeps it
    /// out of the id namespace.
    pub fn temp_record(&self, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self
            .root
            .join(format!(".{}.{}.{}.tmp", id, RECORD_EXTENSION, uuid::Uuid::new_v4())))
    }
}

pub fn validate_id(id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        "id must not be empty"
    } else if id.len() > MAX_ID_LEN {
        "id is too long"
    } else if id.contains(['/', '\\']) {
        "id must not contain path separators"
    } else if id.contains('\0') {
        "id must not contain NUL"
    } else if id.contains("..") {
        "id must not contain '..'"
    } else if id.starts_with('.') {
        "id must not start with '.'"
    } else {
        return Ok(());
    };

    Err(StorageError::InvalidId {
        id: id.to_string(),
        reason,
    })
}
