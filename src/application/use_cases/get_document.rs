use std::sync::Arc;

use uuid::Uuid;

use crate::application::errors::KnowledgeError;
use crate::domain::entities::Document;
use crate::domain::repositories::VectorStore;

#[derive(Debug, Clone)]
pub struct DocumentDetails {
    pub document: Document,
    pub chunk_count: i64,
}

pub struct GetDocumentUseCase {
    store: Arc<dyn VectorStore>,
}

impl GetDocumentUseCase {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, document_id: Uuid) -> Result<DocumentDetails, KnowledgeError> {
        let document = self.store.get_document(document_id).await?;
        let chunk_count = self.store.chunk_count(document_id).await?;

        Ok(DocumentDetails {
            document,
            chunk_count,
        })
    }
}
