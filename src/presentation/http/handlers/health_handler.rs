use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::services::EmbeddingClient;
use crate::presentation::http::dto::HealthResponseDto;

pub struct HealthHandler {
    embedding_client: Arc<EmbeddingClient>,
}

impl HealthHandler {
    pub fn new(embedding_client: Arc<EmbeddingClient>) -> Self {
        Self { embedding_client }
    }

    pub async fn health(State(handler): State<Arc<HealthHandler>>) -> impl IntoResponse {
        let (status, label) = if handler.embedding_client.is_healthy() {
            (StatusCode::OK, "healthy")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "embedding_dimension_mismatch")
        };

        (
            status,
            Json(HealthResponseDto {
                status: label.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            }),
        )
    }
}
