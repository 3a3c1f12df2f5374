use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::use_cases::AskQuestionUseCase;
use crate::presentation::http::dto::{AnswerDto, AskRequestDto};
use crate::presentation::http::error::ApiError;

pub struct AskHandler {
    ask_question_use_case: Arc<AskQuestionUseCase>,
}

impl AskHandler {
    pub fn new(ask_question_use_case: Arc<AskQuestionUseCase>) -> Self {
        Self {
            ask_question_use_case,
        }
    }

    /// An unreachable LLM still yields the retrieved citations, with a 503.
    pub async fn ask(
        State(handler): State<Arc<AskHandler>>,
        body: Result<Json<AskRequestDto>, JsonRejection>,
    ) -> Result<impl IntoResponse, ApiError> {
        let Json(request) = body.map_err(|rejection| ApiError::validation(rejection.body_text()))?;

        let answer = handler.ask_question_use_case.execute(request.into()).await?;
        let status = if answer.error.is_some() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::OK
        };

        Ok((status, Json(AnswerDto::from(answer))))
    }
}
