use uuid::Uuid;

use crate::application::ports::{DocumentExtractionError, FileStorageError};
use crate::domain::repositories::{UploadStagingError, VectorStoreError};

/// Cross-component failure kinds surfaced to callers of the knowledge core.
#[derive(Debug)]
pub enum KnowledgeError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge { size: u64, limit: u64 },
    UnsupportedFormat(String),
    CorruptDocument(String),
    EmptyExtraction,
    EmbeddingDimMismatch { expected: usize, actual: usize },
    MigrationRequired(String),
    EmbeddingUnavailable(String),
    StorageUnavailable(String),
    StorageCorrupt(String),
    LlmUnavailable(String),
    Overloaded,
    InternalInvariantViolated(String),
}

impl KnowledgeError {
    pub fn code(&self) -> &'static str {
        match self {
            KnowledgeError::Validation(_) => "VALIDATION",
            KnowledgeError::NotFound(_) => "NOT_FOUND",
            KnowledgeError::Conflict(_) => "CONFLICT",
            KnowledgeError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            KnowledgeError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            KnowledgeError::CorruptDocument(_) => "CORRUPT_DOCUMENT",
            KnowledgeError::EmptyExtraction => "EMPTY_EXTRACTION",
            KnowledgeError::EmbeddingDimMismatch { .. } => "EMBEDDING_DIM_MISMATCH",
            KnowledgeError::MigrationRequired(_) => "MIGRATION_REQUIRED",
            KnowledgeError::EmbeddingUnavailable(_) => "EMBEDDING_UNAVAILABLE",
            KnowledgeError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            KnowledgeError::StorageCorrupt(_) => "STORAGE_CORRUPT",
            KnowledgeError::LlmUnavailable(_) => "LLM_UNAVAILABLE",
            KnowledgeError::Overloaded => "OVERLOADED",
            KnowledgeError::InternalInvariantViolated(_) => "INTERNAL_INVARIANT_VIOLATED",
        }
    }

    pub fn document_not_found(id: Uuid) -> Self {
        KnowledgeError::NotFound(format!("Document {} not found", id))
    }

    pub fn upload_not_found(id: Uuid) -> Self {
        KnowledgeError::NotFound(format!("Upload {} not found or expired", id))
    }
}

impl std::fmt::Display for KnowledgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KnowledgeError::Validation(msg) => write!(f, "Validation error: {}", msg),
            KnowledgeError::NotFound(msg) => write!(f, "{}", msg),
            KnowledgeError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            KnowledgeError::PayloadTooLarge { size, limit } => write!(
                f,
                "Payload of {} bytes exceeds the {} byte limit",
                size, limit
            ),
            KnowledgeError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            KnowledgeError::CorruptDocument(msg) => write!(f, "Corrupt document: {}", msg),
            KnowledgeError::EmptyExtraction => {
                write!(f, "The document contains no extractable text")
            }
            KnowledgeError::EmbeddingDimMismatch { expected, actual } => write!(
                f,
                "Embedding dimension mismatch: expected {}, got {}",
                expected, actual
            ),
            KnowledgeError::MigrationRequired(msg) => write!(f, "Migration required: {}", msg),
            KnowledgeError::EmbeddingUnavailable(msg) => {
                write!(f, "Embedding service unavailable: {}", msg)
            }
            KnowledgeError::StorageUnavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            KnowledgeError::StorageCorrupt(msg) => write!(f, "Storage corrupt: {}", msg),
            KnowledgeError::LlmUnavailable(msg) => write!(f, "LLM unavailable: {}", msg),
            KnowledgeError::Overloaded => write!(f, "Too many ingests in flight, retry later"),
            KnowledgeError::InternalInvariantViolated(msg) => {
                write!(f, "Internal invariant violated: {}", msg)
            }
        }
    }
}

impl std::error::Error for KnowledgeError {}

impl From<VectorStoreError> for KnowledgeError {
    fn from(error: VectorStoreError) -> Self {
        match error {
            VectorStoreError::NotFound(id) => KnowledgeError::document_not_found(id),
            VectorStoreError::Conflict(msg) => KnowledgeError::Conflict(msg),
            VectorStoreError::InvalidData(msg) => KnowledgeError::InternalInvariantViolated(msg),
            VectorStoreError::Unavailable(msg) => KnowledgeError::StorageUnavailable(msg),
            VectorStoreError::Corrupt(msg) => KnowledgeError::StorageCorrupt(msg),
            VectorStoreError::MigrationRequired(msg) => KnowledgeError::MigrationRequired(msg),
            VectorStoreError::DimMismatch { expected, actual } => {
                KnowledgeError::EmbeddingDimMismatch { expected, actual }
            }
        }
    }
}

impl From<DocumentExtractionError> for KnowledgeError {
    fn from(error: DocumentExtractionError) -> Self {
        match error {
            DocumentExtractionError::UnsupportedFormat(msg) => {
                KnowledgeError::UnsupportedFormat(msg)
            }
            DocumentExtractionError::CorruptDocument(msg) => KnowledgeError::CorruptDocument(msg),
            DocumentExtractionError::EmptyExtraction => KnowledgeError::EmptyExtraction,
            DocumentExtractionError::IoError(msg) => KnowledgeError::InternalInvariantViolated(
                format!("extractor I/O failure: {}", msg),
            ),
        }
    }
}

impl From<UploadStagingError> for KnowledgeError {
    fn from(error: UploadStagingError) -> Self {
        match error {
            UploadStagingError::DatabaseError(msg) => KnowledgeError::StorageUnavailable(msg),
            UploadStagingError::SerializationError(msg) => KnowledgeError::StorageCorrupt(msg),
        }
    }
}

impl From<FileStorageError> for KnowledgeError {
    fn from(error: FileStorageError) -> Self {
        match error {
            FileStorageError::FileNotFound(key) => {
                KnowledgeError::StorageCorrupt(format!("staged payload {} is missing", key))
            }
            FileStorageError::IoError(msg) => KnowledgeError::StorageUnavailable(msg),
        }
    }
}
