use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::DocumentHandler;

pub fn document_routes(document_handler: Arc<DocumentHandler>) -> Router {
    Router::new()
        .route(
            "/documents",
            post(DocumentHandler::upload_document).get(DocumentHandler::list_documents),
        )
        .route(
            "/documents/{document_id}",
            get(DocumentHandler::get_document).delete(DocumentHandler::delete_document),
        )
        .with_state(document_handler)
}
