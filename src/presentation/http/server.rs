use axum::{Router, extract::DefaultBodyLimit};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::infrastructure::AppContainer;
use crate::presentation::http::routes::{
    admin_routes, ask_routes, document_routes, health_routes, upload_routes,
};

pub const API_PREFIX: &str = "/ai-knowledge";

/// Room for multipart framing and the optional summary on top of the
/// payload limit, so oversized payloads reach the ingestor and get a
/// structured 413.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(container: &AppContainer) -> Router {
    let body_limit =
        container.config.ingestor.max_upload_bytes as usize + MULTIPART_OVERHEAD_BYTES;

    let api = Router::new()
        .merge(document_routes(container.document_handler.clone()))
        .merge(upload_routes(container.upload_handler.clone()))
        .merge(ask_routes(container.ask_handler.clone()))
        .merge(admin_routes(container.admin_handler.clone()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health_routes(container.health_handler.clone()))
        .nest(API_PREFIX, api)
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .on_request(
                    |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                        tracing::info!("Received request: {} {}", request.method(), request.uri());
                    },
                )
                .on_response(
                    |response: &axum::http::Response<axum::body::Body>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            "Response: {} (took {} ms)",
                            response.status(),
                            latency.as_millis()
                        );
                    },
                )
                .on_failure(
                    |error: ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::error!(
                            "Request failed: {:?} (took {} ms)",
                            error,
                            latency.as_millis()
                        );
                    },
                ),
        )
}

pub struct HttpServer {
    router: Router,
    port: u16,
}

impl HttpServer {
    pub fn new(container: &AppContainer) -> Self {
        Self {
            router: build_router(container),
            port: container.config.port,
        }
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests.
    pub async fn run<S>(self, shutdown: S) -> Result<(), Box<dyn std::error::Error>>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
