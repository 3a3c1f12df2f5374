use async_trait::async_trait;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use zip::ZipArchive;

use super::{DocxExtractor, FormatExtractor, PdfExtractor, TextExtractor, XlsxExtractor, normalize_text};
use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, ExtractedContent,
};
use crate::domain::value_objects::DocumentFormat;

const SNIFF_WINDOW: usize = 8192;
const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown", "csv", "tsv", "log"];

/// Picks an extractor from the payload's content and runs it on the
/// blocking pool.
pub struct CompositeDocumentExtractor {
    pdf_extractor: Arc<PdfExtractor>,
    docx_extractor: Arc<DocxExtractor>,
    xlsx_extractor: Arc<XlsxExtractor>,
    text_extractor: Arc<TextExtractor>,
}

impl CompositeDocumentExtractor {
    pub fn new() -> Self {
        Self {
            pdf_extractor: Arc::new(PdfExtractor::new()),
            docx_extractor: Arc::new(DocxExtractor::new()),
            xlsx_extractor: Arc::new(XlsxExtractor::new()),
            text_extractor: Arc::new(TextExtractor::new()),
        }
    }

    fn get_extractor_for_format(&self, format: DocumentFormat) -> Arc<dyn FormatExtractor> {
        match format {
            DocumentFormat::Pdf => self.pdf_extractor.clone(),
            DocumentFormat::Docx => self.docx_extractor.clone(),
            DocumentFormat::Xlsx => self.xlsx_extractor.clone(),
            DocumentFormat::PlainText => self.text_extractor.clone(),
        }
    }
}

impl Default for CompositeDocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// What the client claims, from the content type first and the filename
/// extension second.
fn declared_format(mime: &str, filename: &str) -> Option<DocumentFormat> {
    let mime = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let by_mime = match mime.as_str() {
        "application/pdf" => Some(DocumentFormat::Pdf),
        m if m == DocumentFormat::Docx.canonical_mime() => Some(DocumentFormat::Docx),
        m if m == DocumentFormat::Xlsx.canonical_mime() => Some(DocumentFormat::Xlsx),
        m if m.starts_with("text/") => Some(DocumentFormat::PlainText),
        _ => None,
    };
    if by_mime.is_some() {
        return by_mime;
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;
    match extension.as_str() {
        "pdf" => Some(DocumentFormat::Pdf),
        "docx" => Some(DocumentFormat::Docx),
        "xlsx" => Some(DocumentFormat::Xlsx),
        e if TEXT_EXTENSIONS.contains(&e) => Some(DocumentFormat::PlainText),
        _ => None,
    }
}

/// Tells DOCX from XLSX by their main part. Other archives are unsupported.
fn sniff_ooxml(data: &[u8]) -> Option<DocumentFormat> {
    let archive = ZipArchive::new(Cursor::new(data)).ok()?;
    if archive.file_names().any(|name| name == "word/document.xml") {
        return Some(DocumentFormat::Docx);
    }
    if archive.file_names().any(|name| name == "xl/workbook.xml") {
        return Some(DocumentFormat::Xlsx);
    }
    None
}

/// Text unless the head of the payload carries a meaningful share of
/// control bytes.
fn looks_textual(data: &[u8]) -> bool {
    let head = &data[..data.len().min(SNIFF_WINDOW)];
    if head.is_empty() {
        return true;
    }
    let binary = head
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0c | 0x1b))
        .count();
    binary * 100 <= head.len()
}

fn sniff(data: &[u8]) -> Option<DocumentFormat> {
    let head = &data[..data.len().min(1024)];
    if head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        return Some(DocumentFormat::Pdf);
    }
    if data.starts_with(ZIP_MAGIC) {
        return sniff_ooxml(data);
    }
    if looks_textual(data) {
        return Some(DocumentFormat::PlainText);
    }
    None
}

#[async_trait]
impl DocumentExtractor for CompositeDocumentExtractor {
    fn detect_format(
        &self,
        data: &[u8],
        mime: &str,
        filename: &str,
    ) -> Result<DocumentFormat, DocumentExtractionError> {
        let declared = declared_format(mime, filename);
        let detected = sniff(data);

        match (declared, detected) {
            (_, Some(format)) if format != DocumentFormat::PlainText => Ok(format),
            // A binary container that lost its magic bytes is damaged, not text.
            (Some(claimed), Some(DocumentFormat::PlainText)) if claimed != DocumentFormat::PlainText => {
                Err(DocumentExtractionError::CorruptDocument(format!(
                    "payload declared as {} does not have a {} structure",
                    claimed, claimed
                )))
            }
            (_, Some(format)) => Ok(format),
            (Some(claimed), None) if claimed != DocumentFormat::PlainText => {
                Err(DocumentExtractionError::CorruptDocument(format!(
                    "payload declared as {} does not have a {} structure",
                    claimed, claimed
                )))
            }
            _ => Err(DocumentExtractionError::UnsupportedFormat(if mime.is_empty() {
                filename.to_string()
            } else {
                mime.to_string()
            })),
        }
    }

    async fn extract(
        &self,
        data: Vec<u8>,
        format: DocumentFormat,
    ) -> Result<ExtractedContent, DocumentExtractionError> {
        let extractor = self.get_extractor_for_format(format);

        let (raw, pages) = tokio::task::spawn_blocking(move || extractor.extract_bytes(&data))
            .await
            .map_err(|e| DocumentExtractionError::IoError(format!("extraction task failed: {}", e)))??;

        let text = normalize_text(&raw);
        if text.trim().is_empty() {
            return Err(DocumentExtractionError::EmptyExtraction);
        }

        Ok(ExtractedContent {
            text,
            pages,
            format,
        })
    }
}
