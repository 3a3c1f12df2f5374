use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::UploadHandler;

pub fn upload_routes(upload_handler: Arc<UploadHandler>) -> Router {
    Router::new()
        .route("/uploads", post(UploadHandler::begin_upload))
        .route("/uploads/{upload_id}", get(UploadHandler::upload_status))
        .route("/uploads/{upload_id}/commit", post(UploadHandler::commit_upload))
        .with_state(upload_handler)
}
