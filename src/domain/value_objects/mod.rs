pub mod content_checksum;
pub mod document_format;
pub mod normalized_vector;

pub use content_checksum::ContentChecksum;
pub use document_format::DocumentFormat;
pub use normalized_vector::{NormalizedVector, VectorError};
