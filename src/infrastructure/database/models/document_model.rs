use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::Document as DomainDocument;
use crate::domain::value_objects::ContentChecksum;
use crate::infrastructure::database::schema::ai_documents;

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = ai_documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentModel {
    pub id: Uuid,
    pub filename: String,
    pub mime: String,
    pub size_bytes: i64,
    pub pages: Option<i32>,
    pub summary: Option<String>,
    pub content_sha256: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&DomainDocument> for DocumentModel {
    fn from(document: &DomainDocument) -> Self {
        Self {
            id: document.id(),
            filename: document.filename().to_string(),
            mime: document.mime().to_string(),
            size_bytes: document.size_bytes(),
            pages: document.pages(),
            summary: document.summary().map(|s| s.to_string()),
            content_sha256: document.checksum().map(|c| c.as_str().to_string()),
            created_at: document.created_at(),
        }
    }
}

impl TryFrom<DocumentModel> for DomainDocument {
    type Error = String;

    fn try_from(model: DocumentModel) -> Result<Self, Self::Error> {
        let checksum = model.content_sha256.map(ContentChecksum::new).transpose()?;

        Ok(DomainDocument::restore(
            model.id,
            model.filename,
            model.mime,
            model.size_bytes,
            model.pages,
            model.summary,
            checksum,
            model.created_at,
        ))
    }
}
