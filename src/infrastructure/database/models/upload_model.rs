use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::{UploadMeta, UploadStaging};
use crate::infrastructure::database::schema::ai_uploads_temp;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = ai_uploads_temp)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UploadModel {
    pub upload_id: Uuid,
    pub meta: serde_json::Value,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&UploadStaging> for UploadModel {
    type Error = serde_json::Error;

    fn try_from(staging: &UploadStaging) -> Result<Self, Self::Error> {
        Ok(Self {
            upload_id: staging.upload_id(),
            meta: serde_json::to_value(staging.meta())?,
            expires_at: staging.expires_at(),
            created_at: staging.created_at(),
        })
    }
}

impl TryFrom<UploadModel> for UploadStaging {
    type Error = serde_json::Error;

    fn try_from(model: UploadModel) -> Result<Self, Self::Error> {
        let meta: UploadMeta = serde_json::from_value(model.meta)?;
        Ok(UploadStaging::restore(
            model.upload_id,
            meta,
            model.created_at,
            model.expires_at,
        ))
    }
}
