use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::UploadStaging;

#[derive(Debug)]
pub enum UploadStagingError {
    DatabaseError(String),
    SerializationError(String),
}

impl std::fmt::Display for UploadStagingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStagingError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            UploadStagingError::SerializationError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for UploadStagingError {}

#[async_trait]
pub trait UploadStagingRepository: Send + Sync {
    async fn save(&self, staging: &UploadStaging) -> Result<(), UploadStagingError>;
    async fn find(&self, upload_id: Uuid) -> Result<Option<UploadStaging>, UploadStagingError>;
    async fn delete(&self, upload_id: Uuid) -> Result<bool, UploadStagingError>;
    /// Removes and returns the upload in one step; of several concurrent
    /// callers at most one gets `Some`.
    async fn take(&self, upload_id: Uuid) -> Result<Option<UploadStaging>, UploadStagingError>;
    async fn find_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<UploadStaging>, UploadStagingError>;
}
