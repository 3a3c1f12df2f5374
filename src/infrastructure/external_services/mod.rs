pub mod document_extractors;
pub mod inference_client;
pub mod openai_embedding_provider;
pub mod openai_llm_provider;
pub mod tiktoken_tokenizer;

pub use inference_client::{InferenceClient, InferenceClientConfig};
pub use openai_embedding_provider::OpenAiEmbeddingProvider;
pub use openai_llm_provider::OpenAiLlmProvider;
pub use tiktoken_tokenizer::TiktokenTokenizer;
