use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const REFUSAL_TEXT: &str = "I don't know from the indexed material.";

/// One nearest-neighbour result from the vector store.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk_id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: i32,
    pub content: String,
    pub score: f64,
}

impl SearchHit {
    pub fn citation(&self) -> Citation {
        Citation {
            document_id: self.document_id,
            chunk_index: self.chunk_index,
            score: self.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub document_id: Uuid,
    pub chunk_index: i32,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerError {
    LlmUnavailable,
}

impl AnswerError {
    pub fn code(&self) -> &'static str {
        match self {
            AnswerError::LlmUnavailable => "LLM_UNAVAILABLE",
        }
    }
}

/// A grounded answer. `text` is `None` only when `error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: Option<String>,
    pub citations: Vec<Citation>,
    pub error: Option<AnswerError>,
}

impl Answer {
    pub fn grounded(text: String, citations: Vec<Citation>) -> Self {
        Self {
            text: Some(text),
            citations,
            error: None,
        }
    }

    pub fn refusal() -> Self {
        Self {
            text: Some(REFUSAL_TEXT.to_string()),
            citations: Vec::new(),
            error: None,
        }
    }

    pub fn llm_unavailable(citations: Vec<Citation>) -> Self {
        Self {
            text: None,
            citations,
            error: Some(AnswerError::LlmUnavailable),
        }
    }

    pub fn is_refusal(&self) -> bool {
        self.error.is_none() && self.citations.is_empty() && self.text.as_deref() == Some(REFUSAL_TEXT)
    }
}
