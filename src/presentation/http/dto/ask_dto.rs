use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::use_cases::AskQuestionRequest;
use crate::domain::entities::{Answer, Citation};

#[derive(Debug, Deserialize)]
pub struct AskRequestDto {
    pub question: String,
    pub k: Option<usize>,
    pub document_ids: Option<Vec<Uuid>>,
    pub temperature: Option<f32>,
}

impl From<AskRequestDto> for AskQuestionRequest {
    fn from(dto: AskRequestDto) -> Self {
        Self {
            question: dto.question,
            k: dto.k,
            document_ids: dto.document_ids,
            temperature: dto.temperature,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CitationDto {
    pub document_id: Uuid,
    pub chunk_index: i32,
    pub score: f64,
}

impl From<Citation> for CitationDto {
    fn from(citation: Citation) -> Self {
        Self {
            document_id: citation.document_id,
            chunk_index: citation.chunk_index,
            score: citation.score,
        }
    }
}

/// `text` is `null` exactly when `error` is set.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerDto {
    pub text: Option<String>,
    pub citations: Vec<CitationDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Answer> for AnswerDto {
    fn from(answer: Answer) -> Self {
        Self {
            text: answer.text,
            citations: answer.citations.into_iter().map(CitationDto::from).collect(),
            error: answer.error.map(|e| e.code().to_string()),
        }
    }
}
