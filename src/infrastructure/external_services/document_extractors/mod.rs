pub mod composite_extractor;
pub mod docx_extractor;
pub mod pdf_extractor;
pub mod text_extractor;
pub mod xlsx_extractor;

pub use composite_extractor::CompositeDocumentExtractor;
pub use docx_extractor::DocxExtractor;
pub use pdf_extractor::PdfExtractor;
pub use text_extractor::TextExtractor;
pub use xlsx_extractor::XlsxExtractor;

use crate::application::ports::DocumentExtractionError;

/// Separates pages (PDF) and sheets (XLSX) in extracted text.
pub const PAGE_BREAK: char = '\x0c';

/// A synchronous parser for one document family. The composite extractor
/// runs these on the blocking pool.
pub trait FormatExtractor: Send + Sync {
    /// Returns raw text and, for paginated formats, the page count.
    fn extract_bytes(&self, data: &[u8]) -> Result<(String, Option<i32>), DocumentExtractionError>;
}

/// Drops NUL bytes and folds CRLF and lone CR into LF.
pub fn normalize_text(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\0' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                normalized.push('\n');
            }
            other => normalized.push(other),
        }
    }
    normalized
}
