pub mod answer;
pub mod chunk;
pub mod document;
pub mod upload_staging;

pub use answer::{Answer, AnswerError, Citation, SearchHit, REFUSAL_TEXT};
pub use chunk::Chunk;
pub use document::Document;
pub use upload_staging::{UploadMeta, UploadStaging};
