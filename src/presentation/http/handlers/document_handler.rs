use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::{IngestRequest, Ingestor};
use crate::application::use_cases::{
    DeleteDocumentUseCase, GetDocumentUseCase, ListDocumentsRequest, ListDocumentsUseCase,
};
use crate::presentation::http::dto::{
    DocumentDetailDto, DocumentListResponseDto, IngestResponseDto, PaginationDto,
};
use crate::presentation::http::error::ApiError;
use crate::presentation::http::handlers::multipart_upload::read_upload_form;

pub struct DocumentHandler {
    ingestor: Arc<Ingestor>,
    list_documents_use_case: Arc<ListDocumentsUseCase>,
    get_document_use_case: Arc<GetDocumentUseCase>,
    delete_document_use_case: Arc<DeleteDocumentUseCase>,
}

impl DocumentHandler {
    pub fn new(
        ingestor: Arc<Ingestor>,
        list_documents_use_case: Arc<ListDocumentsUseCase>,
        get_document_use_case: Arc<GetDocumentUseCase>,
        delete_document_use_case: Arc<DeleteDocumentUseCase>,
    ) -> Self {
        Self {
            ingestor,
            list_documents_use_case,
            get_document_use_case,
            delete_document_use_case,
        }
    }

    pub async fn upload_document(
        State(handler): State<Arc<DocumentHandler>>,
        multipart: Multipart,
    ) -> Result<impl IntoResponse, ApiError> {
        let form = read_upload_form(multipart).await?;

        let receipt = handler
            .ingestor
            .ingest(IngestRequest {
                data: form.data,
                mime: form.mime,
                filename: form.filename,
                summary: form.summary,
            })
            .await?;

        Ok((StatusCode::CREATED, Json(IngestResponseDto::from(receipt))))
    }

    pub async fn list_documents(
        State(handler): State<Arc<DocumentHandler>>,
        Query(pagination): Query<PaginationDto>,
    ) -> Result<impl IntoResponse, ApiError> {
        let defaults = ListDocumentsRequest::default();
        let request = ListDocumentsRequest {
            offset: pagination.offset.unwrap_or(defaults.offset),
            limit: pagination.limit.unwrap_or(defaults.limit),
        };

        let response = handler.list_documents_use_case.execute(request).await?;
        Ok(Json(DocumentListResponseDto::from(response)))
    }

    pub async fn get_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path(document_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, ApiError> {
        let details = handler.get_document_use_case.execute(document_id).await?;
        Ok(Json(DocumentDetailDto::from(details)))
    }

    pub async fn delete_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path(document_id): Path<Uuid>,
    ) -> Result<StatusCode, ApiError> {
        handler.delete_document_use_case.execute(document_id).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
