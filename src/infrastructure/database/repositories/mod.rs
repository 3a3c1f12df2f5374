pub mod postgres_upload_staging_repository;
pub mod postgres_vector_store;

pub use postgres_upload_staging_repository::PostgresUploadStagingRepository;
pub use postgres_vector_store::{PostgresVectorStore, PostgresVectorStoreConfig};
