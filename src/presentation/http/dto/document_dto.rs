use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::IngestReceipt;
use crate::application::use_cases::{DocumentDetails, ListDocumentsResponse};
use crate::domain::entities::Document;

/// Returned by both single-shot ingest and upload commit.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponseDto {
    pub document_id: Uuid,
    pub filename: String,
    pub pages: Option<i32>,
    pub chunks: usize,
}

impl From<IngestReceipt> for IngestResponseDto {
    fn from(receipt: IngestReceipt) -> Self {
        Self {
            document_id: receipt.document_id,
            filename: receipt.filename,
            pages: receipt.pages,
            chunks: receipt.chunks,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PaginationDto {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentItemDto {
    pub id: Uuid,
    pub filename: String,
    pub pages: Option<i32>,
    pub size_bytes: i64,
    pub created_at: String,
    pub summary: Option<String>,
}

impl From<Document> for DocumentItemDto {
    fn from(document: Document) -> Self {
        Self {
            id: document.id(),
            filename: document.filename().to_string(),
            pages: document.pages(),
            size_bytes: document.size_bytes(),
            created_at: document.created_at().to_rfc3339(),
            summary: document.summary().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentListResponseDto {
    pub items: Vec<DocumentItemDto>,
    pub total: i64,
}

impl From<ListDocumentsResponse> for DocumentListResponseDto {
    fn from(response: ListDocumentsResponse) -> Self {
        Self {
            items: response
                .documents
                .into_iter()
                .map(DocumentItemDto::from)
                .collect(),
            total: response.total,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentDetailDto {
    pub id: Uuid,
    pub filename: String,
    pub mime: String,
    pub pages: Option<i32>,
    pub size_bytes: i64,
    pub summary: Option<String>,
    pub content_sha256: Option<String>,
    pub created_at: String,
    pub chunk_count: i64,
}

impl From<DocumentDetails> for DocumentDetailDto {
    fn from(details: DocumentDetails) -> Self {
        let document = details.document;
        Self {
            id: document.id(),
            filename: document.filename().to_string(),
            mime: document.mime().to_string(),
            pages: document.pages(),
            size_bytes: document.size_bytes(),
            summary: document.summary().map(str::to_string),
            content_sha256: document.checksum().map(|c| c.as_str().to_string()),
            created_at: document.created_at().to_rfc3339(),
            chunk_count: details.chunk_count,
        }
    }
}
