use axum::{Json, extract::State, response::IntoResponse};
use std::sync::Arc;
use std::time::Instant;

use crate::application::KnowledgeError;
use crate::domain::repositories::VectorStore;
use crate::presentation::http::dto::ReindexResponseDto;
use crate::presentation::http::error::ApiError;

pub struct AdminHandler {
    vector_store: Arc<dyn VectorStore>,
}

impl AdminHandler {
    pub fn new(vector_store: Arc<dyn VectorStore>) -> Self {
        Self { vector_store }
    }

    pub async fn reindex(
        State(handler): State<Arc<AdminHandler>>,
    ) -> Result<impl IntoResponse, ApiError> {
        let started = Instant::now();
        let lists = handler
            .vector_store
            .rebuild_index()
            .await
            .map_err(KnowledgeError::from)?;

        tracing::info!(
            "Rebuilt vector index with {} lists in {} ms",
            lists,
            started.elapsed().as_millis()
        );
        Ok(Json(ReindexResponseDto { lists }))
    }
}
