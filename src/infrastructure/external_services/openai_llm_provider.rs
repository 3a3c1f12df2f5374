use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::inference_client::{InferenceClient, InferenceError};
use crate::application::ports::{CompletionRequest, LlmError, LlmProvider};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl From<InferenceError> for LlmError {
    fn from(error: InferenceError) -> Self {
        match error {
            InferenceError::RequestError(msg) => LlmError::NetworkError(msg),
            InferenceError::Timeout => LlmError::Timeout,
            InferenceError::RateLimited => LlmError::RateLimitExceeded,
            e @ InferenceError::ServerError(..) => LlmError::ServiceUnavailable(e.to_string()),
            e @ InferenceError::ClientError(..) => LlmError::Rejected(e.to_string()),
            InferenceError::ParseError(msg) => LlmError::InvalidResponse(msg),
        }
    }
}

/// `POST {base}/chat/completions` in the OpenAI wire format.
pub struct OpenAiLlmProvider {
    client: InferenceClient,
    model: String,
    max_tokens: u32,
}

impl OpenAiLlmProvider {
    pub fn new(client: InferenceClient, model: String, max_tokens: u32) -> Self {
        Self {
            client,
            model,
            max_tokens,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: self.max_tokens,
        };

        let response: ChatResponse = self.client.post_json("chat/completions", &body).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("completion carried no text".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::external_services::inference_client::InferenceClientConfig;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAiLlmProvider {
        let client = InferenceClient::new(InferenceClientConfig {
            base_url: server.uri(),
            api_key: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        OpenAiLlmProvider::new(client, "gpt-4o-mini".to_string(), 256)
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "Answer from context.".to_string(),
            user: "Question: where?".to_string(),
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn test_completion_text_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "temperature": 0.0,
                "max_tokens": 256,
                "messages": [
                    {"role": "system", "content": "Answer from context."},
                    {"role": "user", "content": "Question: where?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": " In the closet [1]. "}}]
            })))
            .mount(&server)
            .await;

        let text = provider(&server).complete(request()).await.unwrap();

        assert_eq!(text, "In the closet [1].");
    }

    #[tokio::test]
    async fn test_errors_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let error = provider(&server).complete(request()).await.unwrap_err();

        assert!(matches!(error, LlmError::ServiceUnavailable(_)));
        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_choice_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let error = provider(&server).complete(request()).await.unwrap_err();

        assert!(matches!(error, LlmError::InvalidResponse(_)));
    }
}
