use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{Chunk, Document, SearchHit};
use crate::domain::value_objects::NormalizedVector;

#[derive(Debug)]
pub enum VectorStoreError {
    NotFound(Uuid),
    Conflict(String),
    /// The write would break a chunk-set invariant.
    InvalidData(String),
    /// Transient failure: pool exhausted, connection lost, statement timeout.
    Unavailable(String),
    /// Data or schema damage that retrying will not fix.
    Corrupt(String),
    MigrationRequired(String),
    DimMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for VectorStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorStoreError::NotFound(id) => write!(f, "Document not found: {}", id),
            VectorStoreError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            VectorStoreError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            VectorStoreError::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            VectorStoreError::Corrupt(msg) => write!(f, "Storage corrupt: {}", msg),
            VectorStoreError::MigrationRequired(msg) => write!(f, "Migration required: {}", msg),
            VectorStoreError::DimMismatch { expected, actual } => write!(
                f,
                "Embedding column has dimension {}, configured dimension is {}",
                actual, expected
            ),
        }
    }
}

impl std::error::Error for VectorStoreError {}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Persists the document and every chunk in one transaction.
    async fn insert_document(
        &self,
        document: &Document,
        chunks: &[Chunk],
    ) -> Result<(), VectorStoreError>;

    /// Returns `false` when no such document existed.
    async fn delete_document(&self, document_id: Uuid) -> Result<bool, VectorStoreError>;

    async fn get_document(&self, document_id: Uuid) -> Result<Document, VectorStoreError>;

    async fn chunk_count(&self, document_id: Uuid) -> Result<i64, VectorStoreError>;

    /// Newest first, with the total row count.
    async fn list_documents(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Document>, i64), VectorStoreError>;

    /// Up to `k` hits ordered by (score desc, document_id asc, chunk_index asc),
    /// all at or above the store's similarity floor.
    async fn search(
        &self,
        query: &NormalizedVector,
        k: usize,
        document_ids: Option<&[Uuid]>,
    ) -> Result<Vec<SearchHit>, VectorStoreError>;

    /// Rebuilds the ANN index; returns the partition count used.
    async fn rebuild_index(&self) -> Result<u32, VectorStoreError>;

    /// Checks that the stored embedding column matches `dimension`.
    async fn verify_schema(&self, dimension: usize) -> Result<(), VectorStoreError>;
}
