use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::DocumentFormat;

/// Metadata for an accepted-but-deferred upload. Persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadMeta {
    pub filename: String,
    pub mime: String,
    pub size_bytes: i64,
    pub format: DocumentFormat,
    /// Key of the payload in the file store.
    pub storage_key: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadStaging {
    upload_id: Uuid,
    meta: UploadMeta,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl UploadStaging {
    pub fn new(meta: UploadMeta, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            upload_id: Uuid::new_v4(),
            meta,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn restore(
        upload_id: Uuid,
        meta: UploadMeta,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            upload_id,
            meta,
            created_at,
            expires_at,
        }
    }

    pub fn upload_id(&self) -> Uuid {
        self.upload_id
    }

    pub fn meta(&self) -> &UploadMeta {
        &self.meta
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> UploadMeta {
        UploadMeta {
            filename: "rota.xlsx".to_string(),
            mime: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            size_bytes: 2048,
            format: DocumentFormat::Xlsx,
            storage_key: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_expiry_window() {
        let staged = UploadStaging::new(meta(), Duration::hours(24));

        assert!(!staged.is_expired_at(Utc::now()));
        assert!(staged.is_expired_at(Utc::now() + Duration::hours(25)));
        assert_eq!(staged.expires_at() - staged.created_at(), Duration::hours(24));
    }

    #[test]
    fn test_meta_json_shape() {
        let value = serde_json::to_value(meta()).unwrap();
        assert_eq!(value["format"], "xlsx");
        assert_eq!(value["size_bytes"], 2048);
    }
}
