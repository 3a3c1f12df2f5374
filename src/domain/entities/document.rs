use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::ContentChecksum;

pub const MAX_SUMMARY_BYTES: usize = 2048;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: Uuid,
    filename: String,
    mime: String,
    size_bytes: i64,
    pages: Option<i32>,
    summary: Option<String>,
    checksum: Option<ContentChecksum>,
    created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        filename: String,
        mime: String,
        size_bytes: i64,
        pages: Option<i32>,
        summary: Option<String>,
        checksum: Option<ContentChecksum>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            mime,
            size_bytes,
            pages,
            summary: summary.map(|s| truncate_to_bytes(&s, MAX_SUMMARY_BYTES)),
            checksum,
            created_at: Utc::now(),
        }
    }

    /// Rebuilds a document from persisted fields without re-assigning identity.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        filename: String,
        mime: String,
        size_bytes: i64,
        pages: Option<i32>,
        summary: Option<String>,
        checksum: Option<ContentChecksum>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            filename,
            mime,
            size_bytes,
            pages,
            summary,
            checksum,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size_bytes(&self) -> i64 {
        self.size_bytes
    }

    pub fn pages(&self) -> Option<i32> {
        self.pages
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn checksum(&self) -> Option<&ContentChecksum> {
        self.checksum.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Cuts `text` to at most `max_bytes` bytes on a char boundary.
pub fn truncate_to_bytes(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }

    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let document = Document::new(
            "handbook.pdf".to_string(),
            "application/pdf".to_string(),
            1024,
            Some(3),
            Some("Cleaning procedures.".to_string()),
            Some(ContentChecksum::of(b"payload")),
        );

        assert_eq!(document.filename(), "handbook.pdf");
        assert_eq!(document.pages(), Some(3));
        assert_eq!(document.size_bytes(), 1024);
        assert_eq!(document.summary(), Some("Cleaning procedures."));
    }

    #[test]
    fn test_new_documents_get_distinct_ids() {
        let a = Document::new("a.txt".into(), "text/plain".into(), 1, None, None, None);
        let b = Document::new("a.txt".into(), "text/plain".into(), 1, None, None, None);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_summary_is_capped() {
        let long = "é".repeat(MAX_SUMMARY_BYTES);
        let document = Document::new("a.txt".into(), "text/plain".into(), 1, None, Some(long), None);

        let summary = document.summary().unwrap();
        assert!(summary.len() <= MAX_SUMMARY_BYTES);
        assert!(summary.chars().all(|c| c == 'é'));
    }
}
