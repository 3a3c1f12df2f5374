pub mod connection;
pub mod models;
pub mod repositories;
pub mod schema;

pub use connection::{
    DatabaseConfig, DatabaseError, DbConnection, DbPool, create_connection_pool,
    embedding_column_dimension, get_connection_from_pool, prepare_schema,
};
