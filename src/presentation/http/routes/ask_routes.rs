use axum::{Router, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::AskHandler;

pub fn ask_routes(ask_handler: Arc<AskHandler>) -> Router {
    Router::new()
        .route("/ask", post(AskHandler::ask))
        .with_state(ask_handler)
}
