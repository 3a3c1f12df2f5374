use crate::application::ports::DocumentExtractionError;

use super::FormatExtractor;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Plain text, Markdown and CSV. Invalid UTF-8 is decoded as Latin-1.
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn decode(data: &[u8]) -> String {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        match std::str::from_utf8(data) {
            Ok(text) => text.to_string(),
            Err(_) => {
                tracing::debug!("Payload is not valid UTF-8; decoding as Latin-1");
                data.iter().map(|&b| b as char).collect()
            }
        }
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatExtractor for TextExtractor {
    fn extract_bytes(&self, data: &[u8]) -> Result<(String, Option<i32>), DocumentExtractionError> {
        Ok((Self::decode(data), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_and_bom() {
        let (text, pages) = TextExtractor::new()
            .extract_bytes("\u{feff}Größe 42".as_bytes())
            .unwrap();
        assert_eq!(text, "Größe 42");
        assert_eq!(pages, None);
    }

    #[test]
    fn test_latin1_fallback() {
        let (text, _) = TextExtractor::new().extract_bytes(b"caf\xe9 cr\xe8me").unwrap();
        assert_eq!(text, "café crème");
    }
}
