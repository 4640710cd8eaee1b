//! Attachment file storage collaborator.
//!
//! The service only ever saves and deletes opaque paths. `LocalFileStorage`
//! keeps files under one root directory and refuses paths that would escape
//! it.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the file storage collaborator.
#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("file storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage path: {0}")]
    InvalidPath(String),
}

/// Where attachment bytes live.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write `bytes` at `storage_path`, creating parent directories.
    async fn save(&self, storage_path: &str, bytes: &[u8]) -> Result<(), FileStorageError>;

    /// Remove the file at `storage_path`. A file that is already gone is not
    /// an error.
    async fn delete(&self, storage_path: &str) -> Result<(), FileStorageError>;
}

/// Files on the local filesystem under a root directory.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, storage_path: &str) -> Result<PathBuf, FileStorageError> {
        let relative = Path::new(storage_path);
        let safe = !storage_path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(FileStorageError::InvalidPath(storage_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save(&self, storage_path: &str, bytes: &[u8]) -> Result<(), FileStorageError> {
        let path = self.resolve(storage_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn delete(&self, storage_path: &str) -> Result<(), FileStorageError> {
        let path = self.resolve(storage_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "attachment file already missing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
