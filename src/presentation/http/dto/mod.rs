pub mod ask_dto;
pub mod document_dto;
pub mod response_dto;
pub mod upload_dto;

pub use ask_dto::*;
pub use document_dto::*;
pub use response_dto::*;
pub use upload_dto::*;
