pub mod ask_question;
pub mod delete_document;
pub mod get_document;
pub mod list_documents;

pub use ask_question::{AskQuestionRequest, AskQuestionUseCase};
pub use delete_document::DeleteDocumentUseCase;
pub use get_document::{DocumentDetails, GetDocumentUseCase};
pub use list_documents::{ListDocumentsRequest, ListDocumentsResponse, ListDocumentsUseCase};
