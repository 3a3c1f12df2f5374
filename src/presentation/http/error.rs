use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::application::KnowledgeError;
use crate::presentation::http::dto::ErrorResponseDto;

/// An error on its way out of the HTTP layer: a status, a stable code and a
/// human message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        KnowledgeError::Validation(message.into()).into()
    }

    pub fn from_multipart(error: MultipartError) -> Self {
        let status = error.status();
        let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
            "PAYLOAD_TOO_LARGE"
        } else {
            "VALIDATION"
        };
        Self {
            status,
            code,
            message: error.body_text(),
        }
    }
}

pub fn status_for(error: &KnowledgeError) -> StatusCode {
    match error {
        KnowledgeError::Validation(_) => StatusCode::BAD_REQUEST,
        KnowledgeError::NotFound(_) => StatusCode::NOT_FOUND,
        KnowledgeError::Conflict(_) => StatusCode::CONFLICT,
        KnowledgeError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        KnowledgeError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        KnowledgeError::CorruptDocument(_) | KnowledgeError::EmptyExtraction => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        KnowledgeError::Overloaded => StatusCode::TOO_MANY_REQUESTS,
        KnowledgeError::EmbeddingUnavailable(_)
        | KnowledgeError::StorageUnavailable(_)
        | KnowledgeError::LlmUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        KnowledgeError::StorageCorrupt(_)
        | KnowledgeError::EmbeddingDimMismatch { .. }
        | KnowledgeError::MigrationRequired(_)
        | KnowledgeError::InternalInvariantViolated(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<KnowledgeError> for ApiError {
    fn from(error: KnowledgeError) -> Self {
        let status = status_for(&error);
        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", error.code(), error);
        }
        Self {
            status,
            code: error.code(),
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponseDto {
            error: self.code.to_string(),
            message: self.message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (self.status, Json(body)).into_response()
    }
}
