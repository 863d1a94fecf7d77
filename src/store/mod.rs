//! Configuration store module
//!
//! Owns the JSON file backing the `free` / `order` lists.
//!
//! - Reads fall back to the default document when the file is absent or
//!   does not hold a JSON object. Every other I/O failure is returned.
//! - Writes create the parent directory and overwrite the file in place
//!   (no temp file, no fsync).
//! - Read-modify-write updates are serialized within this process.

mod document;
mod error;

pub use document::{coerce_list, ConfigDocument, ListUpdate, FREE_FIELD, ORDER_FIELD};
pub use error::StoreError;

use crate::logger;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// File-backed configuration store
pub struct ConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create the directory that will hold the backing file
    pub async fn prepare(&self) -> Result<(), StoreError> {
        ensure_parent_dir(&self.path).await
    }

    /// Load the current document
    pub async fn load(&self) -> Result<ConfigDocument, StoreError> {
        read_config(&self.path).await
    }

    /// Persist a full document
    pub async fn save(&self, doc: &ConfigDocument) -> Result<(), StoreError> {
        write_config(&self.path, doc).await
    }

    /// Merge the supplied lists into the stored document and persist it
    pub async fn update(&self, update: ListUpdate) -> Result<ConfigDocument, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        doc.apply(update);
        self.save(&doc).await?;
        Ok(doc)
    }
}

/// Read the document at `path`
///
/// A missing file or malformed content yields [`ConfigDocument::default`].
pub async fn read_config(path: &Path) -> Result<ConfigDocument, StoreError> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ConfigDocument::default()),
        // Non UTF-8 content is a parse failure, not an I/O fault
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            logger::log_warning(&format!(
                "Configuration file {} is not valid UTF-8, using defaults",
                path.display()
            ));
            return Ok(ConfigDocument::default());
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };

    Ok(ConfigDocument::parse(&text).unwrap_or_else(|| {
        logger::log_warning(&format!(
            "Configuration file {} is malformed, using defaults",
            path.display()
        ));
        ConfigDocument::default()
    }))
}

/// Write `doc` to `path` as indented JSON, replacing any previous content
pub async fn write_config(path: &Path, doc: &ConfigDocument) -> Result<(), StoreError> {
    ensure_parent_dir(path).await?;
    let content = serde_json::to_string_pretty(doc)?;
    fs::write(path, content)
        .await
        .map_err(|e| StoreError::io(path, e))
}

async fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e)),
        _ => Ok(()),
    }
}
