use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::application::ports::DocumentExtractionError;

use super::FormatExtractor;

const DOCUMENT_PART: &str = "word/document.xml";

/// Paragraph text from the main document part, one paragraph per line.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }

    fn document_xml(data: &[u8]) -> Result<String, DocumentExtractionError> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| DocumentExtractionError::CorruptDocument(e.to_string()))?;

        let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| match e {
            ZipError::FileNotFound => DocumentExtractionError::CorruptDocument(format!(
                "archive has no {}",
                DOCUMENT_PART
            )),
            other => DocumentExtractionError::CorruptDocument(other.to_string()),
        })?;

        let mut xml = String::new();
        part.read_to_string(&mut xml)
            .map_err(|e| DocumentExtractionError::CorruptDocument(e.to_string()))?;
        Ok(xml)
    }

    fn paragraphs(xml: &str) -> Result<String, DocumentExtractionError> {
        let mut reader = Reader::from_str(xml);
        let mut text = String::new();
        let mut in_text_run = false;

        loop {
            match reader.read_event() {
                Err(e) => {
                    return Err(DocumentExtractionError::CorruptDocument(format!(
                        "XML error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) => {
                    if e.local_name().as_ref() == b"t" {
                        in_text_run = true;
                    }
                }
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"tab" => text.push('\t'),
                    b"br" | b"cr" => text.push('\n'),
                    _ => (),
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"t" => in_text_run = false,
                    b"p" => text.push('\n'),
                    _ => (),
                },
                Ok(Event::Text(e)) if in_text_run => {
                    let unescaped = e
                        .unescape()
                        .map_err(|e| DocumentExtractionError::CorruptDocument(e.to_string()))?;
                    text.push_str(&unescaped);
                }
                Ok(_) => (),
            }
        }

        Ok(text)
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatExtractor for DocxExtractor {
    fn extract_bytes(&self, data: &[u8]) -> Result<(String, Option<i32>), DocumentExtractionError> {
        let xml = Self::document_xml(data)?;
        Ok((Self::paragraphs(&xml)?, None))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{SimpleFileOptions, ZipWriter};

    pub(crate) fn zip_with(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    pub(crate) fn docx_with(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}</w:body></w:document>",
            body
        );
        zip_with(&[(DOCUMENT_PART, &xml)])
    }

    #[test]
    fn test_paragraphs_become_lines() {
        let data = docx_with(&["Mop the lobby.", "Empty the bins &amp; recycling."]);

        let (text, pages) = DocxExtractor::new().extract_bytes(&data).unwrap();

        assert_eq!(text, "Mop the lobby.\nEmpty the bins & recycling.\n");
        assert_eq!(pages, None);
    }

    #[test]
    fn test_runs_tabs_and_breaks() {
        let xml = "<w:document xmlns:w=\"w\"><w:body><w:p>\
                   <w:r><w:t>Room</w:t></w:r><w:r><w:tab/><w:t>Floor</w:t></w:r>\
                   <w:r><w:br/><w:t>2</w:t></w:r></w:p></w:body></w:document>";

        let text = DocxExtractor::paragraphs(xml).unwrap();

        assert_eq!(text, "Room\tFloor\n2\n");
    }

    #[test]
    fn test_archive_without_document_part_is_corrupt() {
        let data = zip_with(&[("word/styles.xml", "<styles/>")]);
        let result = DocxExtractor::new().extract_bytes(&data);
        assert!(matches!(result, Err(DocumentExtractionError::CorruptDocument(_))));
    }
}
