pub mod document_extractor;
pub mod embedding_provider;
pub mod file_storage;
pub mod llm_provider;
pub mod tokenizer;

pub use document_extractor::{DocumentExtractionError, DocumentExtractor, ExtractedContent};
pub use embedding_provider::{EmbeddingProvider, EmbeddingProviderError};
pub use file_storage::{FileStorage, FileStorageError, StoredFile};
pub use llm_provider::{CompletionRequest, LlmError, LlmProvider};
pub use tokenizer::Tokenizer;
