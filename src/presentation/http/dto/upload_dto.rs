use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::IngestProgress;
use crate::domain::entities::UploadStaging;
use crate::domain::value_objects::DocumentFormat;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponseDto {
    pub upload_id: Uuid,
    pub expires_at: String,
}

impl From<&UploadStaging> for UploadResponseDto {
    fn from(staging: &UploadStaging) -> Self {
        Self {
            upload_id: staging.upload_id(),
            expires_at: staging.expires_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CommitUploadRequestDto {
    pub summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadStatusDto {
    pub upload_id: Uuid,
    pub filename: String,
    pub mime: String,
    pub size_bytes: i64,
    pub format: DocumentFormat,
    pub created_at: String,
    pub expires_at: String,
    /// Present only while a commit of this upload is running.
    pub progress: Option<IngestProgress>,
}

impl From<(UploadStaging, Option<IngestProgress>)> for UploadStatusDto {
    fn from((staging, progress): (UploadStaging, Option<IngestProgress>)) -> Self {
        let meta = staging.meta();
        Self {
            upload_id: staging.upload_id(),
            filename: meta.filename.clone(),
            mime: meta.mime.clone(),
            size_bytes: meta.size_bytes,
            format: meta.format,
            created_at: staging.created_at().to_rfc3339(),
            expires_at: staging.expires_at().to_rfc3339(),
            progress,
        }
    }
}
