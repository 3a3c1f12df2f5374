pub mod admin_routes;
pub mod ask_routes;
pub mod document_routes;
pub mod health_routes;
pub mod upload_routes;

pub use admin_routes::*;
pub use ask_routes::*;
pub use document_routes::*;
pub use health_routes::*;
pub use upload_routes::*;
