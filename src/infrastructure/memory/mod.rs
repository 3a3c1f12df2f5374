pub mod in_memory_upload_staging;
pub mod in_memory_vector_store;

pub use in_memory_upload_staging::InMemoryUploadStaging;
pub use in_memory_vector_store::InMemoryVectorStore;
