pub mod chunker;
pub mod embedding_client;
pub mod ingest_admission;
pub mod ingest_progress;
pub mod ingestor;
pub mod qa_engine;
pub mod retry_policy;

pub use chunker::{Chunker, ChunkerConfig, TextChunk};
pub use embedding_client::{EmbeddingClient, EmbeddingClientConfig};
pub use ingest_admission::IngestAdmission;
pub use ingest_progress::{IngestProgress, IngestProgressRegistry, IngestStage};
pub use ingestor::{IngestReceipt, IngestRequest, Ingestor, IngestorConfig};
pub use qa_engine::{QaEngine, QaEngineConfig, Question};
pub use retry_policy::RetryPolicy;
