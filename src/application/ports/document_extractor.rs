use async_trait::async_trait;

use crate::domain::value_objects::DocumentFormat;

#[derive(Debug)]
pub enum DocumentExtractionError {
    UnsupportedFormat(String),
    CorruptDocument(String),
    /// The document parsed but carried no usable text.
    EmptyExtraction,
    IoError(String),
}

impl std::fmt::Display for DocumentExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentExtractionError::UnsupportedFormat(format) => {
                write!(f, "Unsupported format: {}", format)
            }
            DocumentExtractionError::CorruptDocument(msg) => write!(f, "Corrupt document: {}", msg),
            DocumentExtractionError::EmptyExtraction => write!(f, "No text could be extracted"),
            DocumentExtractionError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for DocumentExtractionError {}

#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// NUL-free, LF-normalised text. Pages or sheets are separated by `\x0c`.
    pub text: String,
    pub pages: Option<i32>,
    pub format: DocumentFormat,
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Sniffs the payload and picks a format; the declared mime type and
    /// filename only break ties.
    fn detect_format(
        &self,
        data: &[u8],
        mime: &str,
        filename: &str,
    ) -> Result<DocumentFormat, DocumentExtractionError>;

    async fn extract(
        &self,
        data: Vec<u8>,
        format: DocumentFormat,
    ) -> Result<ExtractedContent, DocumentExtractionError>;
}
