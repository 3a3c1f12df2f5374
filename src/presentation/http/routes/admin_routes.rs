use axum::{Router, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::AdminHandler;

pub fn admin_routes(admin_handler: Arc<AdminHandler>) -> Router {
    Router::new()
        .route("/admin/reindex", post(AdminHandler::reindex))
        .with_state(admin_handler)
}
