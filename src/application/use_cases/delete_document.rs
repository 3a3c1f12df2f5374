use std::sync::Arc;

use uuid::Uuid;

use crate::application::errors::KnowledgeError;
use crate::domain::repositories::VectorStore;

pub struct DeleteDocumentUseCase {
    store: Arc<dyn VectorStore>,
}

impl DeleteDocumentUseCase {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// The store delete is idempotent; a second call reports `NotFound` so
    /// the HTTP layer can answer 204 then 404.
    pub async fn execute(&self, document_id: Uuid) -> Result<(), KnowledgeError> {
        if self.store.delete_document(document_id).await? {
            tracing::info!("Deleted document {}", document_id);
            Ok(())
        } else {
            Err(KnowledgeError::document_not_found(document_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Chunk, Document};
    use crate::domain::value_objects::NormalizedVector;
    use crate::infrastructure::memory::InMemoryVectorStore;

    #[tokio::test]
    async fn test_second_delete_is_not_found() {
        let store = Arc::new(InMemoryVectorStore::new(2, 0.15));
        let document = Document::new("a.txt".into(), "text/plain".into(), 3, None, None, None);
        let vector = NormalizedVector::normalize(vec![1.0, 1.0]).unwrap();
        let chunks = vec![Chunk::new(document.id(), 0, "abc".into(), 1, vector)];
        store.insert_document(&document, &chunks).await.unwrap();

        let use_case = DeleteDocumentUseCase::new(store.clone());

        use_case.execute(document.id()).await.unwrap();
        let again = use_case.execute(document.id()).await.unwrap_err();

        assert_eq!(again.code(), "NOT_FOUND");
        assert_eq!(store.chunk_count(document.id()).await.unwrap(), 0);
    }
}
