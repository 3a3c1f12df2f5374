use std::sync::Arc;

use crate::application::errors::KnowledgeError;
use crate::domain::entities::Document;
use crate::domain::repositories::VectorStore;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Clone)]
pub struct ListDocumentsRequest {
    pub offset: i64,
    pub limit: i64,
}

impl Default for ListDocumentsRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListDocumentsResponse {
    pub documents: Vec<Document>,
    pub total: i64,
}

pub struct ListDocumentsUseCase {
    store: Arc<dyn VectorStore>,
}

impl ListDocumentsUseCase {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        request: ListDocumentsRequest,
    ) -> Result<ListDocumentsResponse, KnowledgeError> {
        if request.offset < 0 {
            return Err(KnowledgeError::Validation(
                "offset cannot be negative".to_string(),
            ));
        }

        if request.limit <= 0 || request.limit > MAX_PAGE_SIZE {
            return Err(KnowledgeError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let (documents, total) = self
            .store
            .list_documents(request.offset, request.limit)
            .await?;

        Ok(ListDocumentsResponse { documents, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryVectorStore;

    #[tokio::test]
    async fn test_rejects_bad_paging() {
        let use_case = ListDocumentsUseCase::new(Arc::new(InMemoryVectorStore::new(4, 0.15)));

        let negative = use_case
            .execute(ListDocumentsRequest { offset: -1, limit: 10 })
            .await;
        assert_eq!(negative.unwrap_err().code(), "VALIDATION");

        let huge = use_case
            .execute(ListDocumentsRequest { offset: 0, limit: 5000 })
            .await;
        assert_eq!(huge.unwrap_err().code(), "VALIDATION");
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let use_case = ListDocumentsUseCase::new(Arc::new(InMemoryVectorStore::new(4, 0.15)));

        let response = use_case.execute(ListDocumentsRequest::default()).await.unwrap();

        assert!(response.documents.is_empty());
        assert_eq!(response.total, 0);
    }
}
