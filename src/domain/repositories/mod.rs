pub mod upload_staging_repository;
pub mod vector_store;

pub use upload_staging_repository::{UploadStagingError, UploadStagingRepository};
pub use vector_store::{VectorStore, VectorStoreError};
