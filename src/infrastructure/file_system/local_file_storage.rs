use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::file_storage::{FileStorage, FileStorageError, StoredFile};

/// Staged upload payloads, one file per storage key under `base_path`.
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub async fn ensure_directory_exists(&self) -> Result<(), FileStorageError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))
    }

    fn get_file_path(&self, key: Uuid) -> PathBuf {
        self.base_path.join(format!("{}.upload", key))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store_file(&self, data: &[u8]) -> Result<StoredFile, FileStorageError> {
        self.ensure_directory_exists().await?;

        let key = Uuid::new_v4();
        let file_path = self.get_file_path(key);
        let partial_path = file_path.with_extension("partial");

        // A key only resolves once its payload is fully written.
        fs::write(&partial_path, data)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))?;
        fs::rename(&partial_path, &file_path)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))?;

        Ok(StoredFile {
            key,
            size: data.len() as u64,
        })
    }

    async fn retrieve_file(&self, key: Uuid) -> Result<Vec<u8>, FileStorageError> {
        match fs::read(self.get_file_path(key)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(FileStorageError::FileNotFound(key.to_string()))
            }
            Err(e) => Err(FileStorageError::IoError(e.to_string())),
        }
    }

    async fn delete_file(&self, key: Uuid) -> Result<bool, FileStorageError> {
        match fs::remove_file(self.get_file_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FileStorageError::IoError(e.to_string())),
        }
    }
}
