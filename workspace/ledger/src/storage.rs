//! File storage for uploaded proof-of-payment files.
//!
//! Payments only keep an opaque reference returned by [`FileStorage::store`];
//! the bytes live wherever the configured backend puts them.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{LedgerError, Result};

/// Storage directory hint for payment proofs.
pub const RECEIPTS_DIR: &str = "receipts";

/// An uploaded file as received from the client.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            content_type: None,
            bytes,
        }
    }

    /// Lower-cased extension of the original file name, if it has one.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// Extension of a stored reference, used when naming downloads.
pub fn reference_extension(reference: &str) -> Option<&str> {
    Path::new(reference)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}

/// Generates a fresh, collision-free storage key under `destination_hint`.
fn new_key(destination_hint: &str, file: &UploadedFile) -> String {
    let hint = destination_hint.trim_matches('/');
    match file.extension() {
        Some(ext) => format!("{}/{}.{}", hint, Uuid::new_v4(), ext),
        None => format!("{}/{}", hint, Uuid::new_v4()),
    }
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persists `file` and returns an opaque reference to it.
    async fn store(&self, file: &UploadedFile, destination_hint: &str) -> Result<String>;
    async fn exists(&self, reference: &str) -> Result<bool>;
    async fn download(&self, reference: &str) -> Result<Vec<u8>>;
    /// Removes a stored file. Missing files are not an error.
    async fn delete(&self, reference: &str) -> Result<()>;
}

/// Stores files on the local filesystem below `base_path`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await.map_err(|e| {
            LedgerError::Storage(format!(
                "failed to create storage root {}: {}",
                base_path.display(),
                e
            ))
        })?;
        Ok(Self { base_path })
    }

    /// Resolves a reference to a path, refusing anything that could escape
    /// the storage root.
    fn resolve(&self, reference: &str) -> Result<PathBuf> {
        let relative = Path::new(reference);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(LedgerError::Storage(format!(
                "invalid storage reference '{}'",
                reference
            )));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    #[instrument(skip(self, file), fields(size = file.bytes.len()))]
    async fn store(&self, file: &UploadedFile, destination_hint: &str) -> Result<String> {
        let key = new_key(destination_hint, file);
        let path = self.resolve(&key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LedgerError::Storage(format!("failed to create {}: {}", parent.display(), e)))?;
        }
        fs::write(&path, &file.bytes)
            .await
            .map_err(|e| LedgerError::Storage(format!("failed to write {}: {}", key, e)))?;
        debug!("Stored file at {}", key);
        Ok(key)
    }

    async fn exists(&self, reference: &str) -> Result<bool> {
        let path = match self.resolve(reference) {
            Ok(path) => path,
            Err(_) => return Ok(false),
        };
        fs::try_exists(&path)
            .await
            .map_err(|e| LedgerError::Storage(format!("failed to check {}: {}", reference, e)))
    }

    async fn download(&self, reference: &str) -> Result<Vec<u8>> {
        let path = self.resolve(reference)?;
        fs::read(&path)
            .await
            .map_err(|e| LedgerError::Storage(format!("failed to read {}: {}", reference, e)))
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        let path = self.resolve(reference)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Tried to delete missing file {}", reference);
                Ok(())
            }
            Err(e) => Err(LedgerError::Storage(format!(
                "failed to delete {}: {}",
                reference, e
            ))),
        }
    }
}

/// Keeps files in memory. Used by tests and throwaway instances.
#[derive(Debug, Default)]
pub struct InMemoryFileStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn store(&self, file: &UploadedFile, destination_hint: &str) -> Result<String> {
        let key = new_key(destination_hint, file);
        self.files
            .write()
            .await
            .insert(key.clone(), file.bytes.clone());
        Ok(key)
    }

    async fn exists(&self, reference: &str) -> Result<bool> {
        Ok(self.files.read().await.contains_key(reference))
    }

    async fn download(&self, reference: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| LedgerError::Storage(format!("no stored file at {}", reference)))
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        self.files.write().await.remove(reference);
        Ok(())
    }
}
