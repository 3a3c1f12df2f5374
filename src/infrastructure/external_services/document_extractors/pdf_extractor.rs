use lopdf::Document;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::application::ports::DocumentExtractionError;

use super::{FormatExtractor, PAGE_BREAK};

/// Per-page text via lopdf. Pages are parsed in parallel and joined with a
/// form feed. There is no OCR; image-only pages contribute nothing.
pub struct PdfExtractor {
    password: String,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            password: String::new(),
        }
    }

    fn page_texts(&self, doc: &Document) -> Result<Vec<String>, DocumentExtractionError> {
        let pages = doc.get_pages();
        let page_count = pages.len();

        let extracted: Vec<Result<String, String>> = pages
            .into_par_iter()
            .map(|(page_num, _)| {
                doc.extract_text(&[page_num])
                    .map_err(|e| format!("page {}: {}", page_num, e))
            })
            .collect();

        let mut failures = 0;
        let mut texts = Vec::with_capacity(page_count);
        for result in extracted {
            match result {
                Ok(text) => texts.push(clean_page(&text)),
                Err(e) => {
                    tracing::warn!("Failed to extract text from PDF {}", e);
                    failures += 1;
                    texts.push(String::new());
                }
            }
        }

        if page_count > 0 && failures == page_count {
            return Err(DocumentExtractionError::CorruptDocument(
                "no page of the PDF could be decoded".to_string(),
            ));
        }

        Ok(texts)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn clean_page(text: &str) -> String {
    text.split('\n')
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

impl FormatExtractor for PdfExtractor {
    fn extract_bytes(&self, data: &[u8]) -> Result<(String, Option<i32>), DocumentExtractionError> {
        let mut doc = Document::load_mem(data)
            .map_err(|e| DocumentExtractionError::CorruptDocument(e.to_string()))?;

        if doc.is_encrypted() {
            doc.decrypt(&self.password).map_err(|_| {
                DocumentExtractionError::CorruptDocument(
                    "PDF is encrypted and cannot be opened without a password".to_string(),
                )
            })?;
        }

        let pages = self.page_texts(&doc)?;
        let page_count = pages.len() as i32;
        let text = pages.join(&PAGE_BREAK.to_string());

        Ok((text, Some(page_count)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Builds a PDF with one text line per page; `None` yields a page with no
    /// content stream operators.
    pub(crate) fn pdf_with_pages(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in pages {
            let operations = match page {
                Some(text) => vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
                None => vec![],
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_pages_are_counted_and_separated() {
        let data = pdf_with_pages(&[Some("First page"), Some("Second page"), Some("Third page")]);

        let (text, pages) = PdfExtractor::new().extract_bytes(&data).unwrap();

        assert_eq!(pages, Some(3));
        let parts: Vec<&str> = text.split(PAGE_BREAK).collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].contains("Second page"));
    }

    #[test]
    fn test_image_only_pdf_has_no_text() {
        let data = pdf_with_pages(&[None, None]);

        let (text, pages) = PdfExtractor::new().extract_bytes(&data).unwrap();

        assert_eq!(pages, Some(2));
        assert!(text.replace(PAGE_BREAK, "").trim().is_empty());
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let result = PdfExtractor::new().extract_bytes(b"%PDF-1.7\nthis is not a pdf");
        assert!(matches!(result, Err(DocumentExtractionError::CorruptDocument(_))));
    }
}
