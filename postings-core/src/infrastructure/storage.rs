use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Io(err) if err.kind() == io::ErrorKind::NotFound)
    }
}

/// An uploaded payload and the name the client gave it.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(original_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes,
        }
    }

    /// Text after the last `.` of the original name, if any.
    pub fn extension(&self) -> Option<&str> {
        self.original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// Where an upload ended up. Both fields carry the same reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub image_url: String,
    pub path: String,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn upload(&self, namespace: &str, file: UploadedFile) -> Result<StoredFile, StorageError>;
    async fn image_url(&self, key: &str) -> Result<String, StorageError>;
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn namespace_dir(&self, namespace: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(namespace);
        let valid = !namespace.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !valid {
            return Err(StorageError::InvalidNamespace(namespace.to_string()));
        }
        Ok(self.base_path.join(relative))
    }
}

fn generate_filename(file: &UploadedFile) -> String {
    let id = Uuid::new_v4();
    match file.extension() {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn upload(&self, namespace: &str, file: UploadedFile) -> Result<StoredFile, StorageError> {
        let dir = self.namespace_dir(namespace)?;
        let file_path = dir.join(generate_filename(&file));

        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(&file_path, &file.bytes).await?;

        let path = file_path.to_string_lossy().into_owned();
        info!(path = %path, size = file.bytes.len(), "file uploaded");
        Ok(StoredFile {
            image_url: path.clone(),
            path,
        })
    }

    async fn image_url(&self, key: &str) -> Result<String, StorageError> {
        Ok(key.to_string())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        tokio::fs::remove_file(path).await?;
        debug!(path = %path, "file deleted");
        Ok(())
    }
}
