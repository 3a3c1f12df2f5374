pub mod admin_handler;
pub mod ask_handler;
pub mod document_handler;
pub mod health_handler;
pub mod multipart_upload;
pub mod upload_handler;

pub use admin_handler::AdminHandler;
pub use ask_handler::AskHandler;
pub use document_handler::DocumentHandler;
pub use health_handler::HealthHandler;
pub use upload_handler::UploadHandler;
