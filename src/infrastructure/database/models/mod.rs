pub mod chunk_model;
pub mod document_model;
pub mod upload_model;

pub use chunk_model::*;
pub use document_model::*;
pub use upload_model::*;
