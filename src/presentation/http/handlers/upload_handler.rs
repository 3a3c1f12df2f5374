use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::Ingestor;
use crate::presentation::http::dto::{
    CommitUploadRequestDto, IngestResponseDto, UploadResponseDto, UploadStatusDto,
};
use crate::presentation::http::error::ApiError;
use crate::presentation::http::handlers::multipart_upload::read_upload_form;

/// Two-phase ingest: stage the payload now, commit it later.
pub struct UploadHandler {
    ingestor: Arc<Ingestor>,
}

impl UploadHandler {
    pub fn new(ingestor: Arc<Ingestor>) -> Self {
        Self { ingestor }
    }

    pub async fn begin_upload(
        State(handler): State<Arc<UploadHandler>>,
        multipart: Multipart,
    ) -> Result<impl IntoResponse, ApiError> {
        let form = read_upload_form(multipart).await?;

        let staging = handler
            .ingestor
            .begin_upload(form.data, form.mime, form.filename)
            .await?;

        Ok((StatusCode::CREATED, Json(UploadResponseDto::from(&staging))))
    }

    pub async fn commit_upload(
        State(handler): State<Arc<UploadHandler>>,
        Path(upload_id): Path<Uuid>,
        body: Bytes,
    ) -> Result<impl IntoResponse, ApiError> {
        // The body is optional; an empty one means "no summary".
        let request: CommitUploadRequestDto = if body.iter().all(u8::is_ascii_whitespace) {
            CommitUploadRequestDto::default()
        } else {
            serde_json::from_slice(&body).map_err(|e| ApiError::validation(e.to_string()))?
        };

        let receipt = handler
            .ingestor
            .commit_upload(upload_id, request.summary)
            .await?;

        Ok((StatusCode::CREATED, Json(IngestResponseDto::from(receipt))))
    }

    pub async fn upload_status(
        State(handler): State<Arc<UploadHandler>>,
        Path(upload_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, ApiError> {
        let status = handler.ingestor.upload_status(upload_id).await?;
        Ok(Json(UploadStatusDto::from(status)))
    }
}
