use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entities::UploadStaging;
use crate::domain::repositories::{UploadStagingError, UploadStagingRepository};

#[derive(Default)]
pub struct InMemoryUploadStaging {
    uploads: Mutex<HashMap<Uuid, UploadStaging>>,
}

impl InMemoryUploadStaging {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadStagingRepository for InMemoryUploadStaging {
    async fn save(&self, staging: &UploadStaging) -> Result<(), UploadStagingError> {
        self.uploads
            .lock()
            .await
            .insert(staging.upload_id(), staging.clone());
        Ok(())
    }

    async fn find(&self, upload_id: Uuid) -> Result<Option<UploadStaging>, UploadStagingError> {
        Ok(self.uploads.lock().await.get(&upload_id).cloned())
    }

    async fn delete(&self, upload_id: Uuid) -> Result<bool, UploadStagingError> {
        Ok(self.uploads.lock().await.remove(&upload_id).is_some())
    }

    async fn take(&self, upload_id: Uuid) -> Result<Option<UploadStaging>, UploadStagingError> {
        Ok(self.uploads.lock().await.remove(&upload_id))
    }

    async fn find_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<UploadStaging>, UploadStagingError> {
        Ok(self
            .uploads
            .lock()
            .await
            .values()
            .filter(|staging| staging.is_expired_at(now))
            .cloned()
            .collect())
    }
}
