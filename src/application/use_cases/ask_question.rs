use std::sync::Arc;

use uuid::Uuid;

use crate::application::errors::KnowledgeError;
use crate::application::services::qa_engine::{QaEngine, Question};
use crate::domain::entities::Answer;

pub const DEFAULT_K: usize = 6;
pub const MAX_K: usize = 50;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const MAX_QUESTION_CHARS: usize = 4000;

#[derive(Debug, Clone, Default)]
pub struct AskQuestionRequest {
    pub question: String,
    pub k: Option<usize>,
    pub document_ids: Option<Vec<Uuid>>,
    pub temperature: Option<f32>,
}

pub struct AskQuestionUseCase {
    engine: Arc<QaEngine>,
}

impl AskQuestionUseCase {
    pub fn new(engine: Arc<QaEngine>) -> Self {
        Self { engine }
    }

    pub async fn execute(&self, request: AskQuestionRequest) -> Result<Answer, KnowledgeError> {
        let question = validate(request)?;
        self.engine.answer(question).await
    }
}

fn validate(request: AskQuestionRequest) -> Result<Question, KnowledgeError> {
    let text = request.question.trim();
    if text.is_empty() {
        return Err(KnowledgeError::Validation(
            "question cannot be empty".to_string(),
        ));
    }
    if text.chars().count() > MAX_QUESTION_CHARS {
        return Err(KnowledgeError::Validation(format!(
            "question is longer than {} characters",
            MAX_QUESTION_CHARS
        )));
    }

    let k = request.k.unwrap_or(DEFAULT_K);
    if !(1..=MAX_K).contains(&k) {
        return Err(KnowledgeError::Validation(format!(
            "k must be between 1 and {}",
            MAX_K
        )));
    }

    let temperature = request.temperature.unwrap_or(DEFAULT_TEMPERATURE);
    if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
        return Err(KnowledgeError::Validation(
            "temperature must be between 0 and 2".to_string(),
        ));
    }

    if request.document_ids.as_ref().is_some_and(|ids| ids.is_empty()) {
        return Err(KnowledgeError::Validation(
            "document_ids, when given, must not be empty".to_string(),
        ));
    }

    Ok(Question {
        text: text.to_string(),
        k,
        document_ids: request.document_ids,
        temperature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(question: &str) -> AskQuestionRequest {
        AskQuestionRequest {
            question: question.to_string(),
            ..AskQuestionRequest::default()
        }
    }

    #[test]
    fn test_defaults_are_applied() {
        let question = validate(request("  where are the mops?  ")).unwrap();

        assert_eq!(question.text, "where are the mops?");
        assert_eq!(question.k, DEFAULT_K);
        assert!((question.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
        assert!(question.document_ids.is_none());
    }

    #[test]
    fn test_invalid_requests_are_rejected() {
        assert!(validate(request("   ")).is_err());
        assert!(validate(AskQuestionRequest { k: Some(0), ..request("q") }).is_err());
        assert!(validate(AskQuestionRequest { k: Some(51), ..request("q") }).is_err());
        assert!(validate(AskQuestionRequest { temperature: Some(2.5), ..request("q") }).is_err());
        assert!(
            validate(AskQuestionRequest {
                document_ids: Some(vec![]),
                ..request("q")
            })
            .is_err()
        );
    }
}
