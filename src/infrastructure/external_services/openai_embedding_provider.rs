use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::inference_client::{InferenceClient, InferenceError};
use crate::application::ports::{EmbeddingProvider, EmbeddingProviderError};

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl From<InferenceError> for EmbeddingProviderError {
    fn from(error: InferenceError) -> Self {
        match error {
            InferenceError::RequestError(msg) => EmbeddingProviderError::NetworkError(msg),
            InferenceError::Timeout => EmbeddingProviderError::Timeout,
            InferenceError::RateLimited => EmbeddingProviderError::RateLimitExceeded,
            e @ InferenceError::ServerError(..) => {
                EmbeddingProviderError::ServiceUnavailable(e.to_string())
            }
            e @ InferenceError::ClientError(..) => EmbeddingProviderError::Rejected(e.to_string()),
            InferenceError::ParseError(msg) => EmbeddingProviderError::InvalidResponse(msg),
        }
    }
}

/// `POST {base}/embeddings` in the OpenAI wire format.
pub struct OpenAiEmbeddingProvider {
    client: InferenceClient,
    model: String,
}

impl OpenAiEmbeddingProvider {
    pub fn new(client: InferenceClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingsRequest {
            model: &self.model,
            input: texts,
            encoding_format: "float",
        };
        let mut response: EmbeddingsResponse =
            self.client.post_json("embeddings", &request).await?;

        if response.data.len() != texts.len() {
            return Err(EmbeddingProviderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }

        // Upstream may answer out of order; `index` is authoritative.
        response.data.sort_by_key(|item| item.index);
        if response.data.iter().enumerate().any(|(i, item)| item.index != i) {
            return Err(EmbeddingProviderError::InvalidResponse(
                "embedding indexes are not a permutation of the inputs".to_string(),
            ));
        }

        Ok(response.data.into_iter().map(|item| item.embedding).collect())
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
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAiEmbeddingProvider {
        let client = InferenceClient::new(InferenceClientConfig {
            base_url: format!("{}/v1", server.uri()),
            api_key: Some("sk-test".to_string()),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        OpenAiEmbeddingProvider::new(client, "text-embedding-3-small".to_string())
    }

    #[tokio::test]
    async fn test_vectors_follow_response_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "text-embedding-3-small",
                "input": ["first", "second"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [
                    {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                    {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
                ],
                "model": "text-embedding-3-small"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let vectors = provider(&server)
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_status_classification() {
        let server = MockServer::start().await;
        let provider = provider(&server);
        let input = vec!["text".to_string()];

        for (status, retryable) in [(429, true), (503, true), (400, false), (401, false)] {
            let guard = Mock::given(method("POST"))
                .and(path("/v1/embeddings"))
                .respond_with(ResponseTemplate::new(status).set_body_string("upstream says no"))
                .mount_as_scoped(&server)
                .await;

            let error = provider.embed_batch(&input).await.unwrap_err();
            assert_eq!(error.is_retryable(), retryable, "status {}", status);
            drop(guard);
        }
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_not_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
            .mount(&server)
            .await;

        let error = provider(&server)
            .embed_batch(&["text".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(error, EmbeddingProviderError::InvalidResponse(_)));
        assert!(!error.is_retryable());
    }
}
