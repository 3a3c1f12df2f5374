use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug)]
pub enum FileStorageError {
    FileNotFound(String),
    IoError(String),
}

impl std::fmt::Display for FileStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStorageError::FileNotFound(key) => write!(f, "File not found: {}", key),
            FileStorageError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for FileStorageError {}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub key: Uuid,
    pub size: u64,
}

/// Holds staged upload payloads until they are committed or reaped.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store_file(&self, data: &[u8]) -> Result<StoredFile, FileStorageError>;

    async fn retrieve_file(&self, key: Uuid) -> Result<Vec<u8>, FileStorageError>;

    /// Returns `false` when nothing was stored under `key`.
    async fn delete_file(&self, key: Uuid) -> Result<bool, FileStorageError>;
}
