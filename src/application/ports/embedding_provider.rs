use async_trait::async_trait;

#[derive(Debug)]
pub enum EmbeddingProviderError {
    NetworkError(String),
    Timeout,
    RateLimitExceeded,
    /// Upstream answered 5xx.
    ServiceUnavailable(String),
    /// Upstream refused the request (4xx other than 429).
    Rejected(String),
    /// The response body did not match the expected schema.
    InvalidResponse(String),
}

impl EmbeddingProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EmbeddingProviderError::NetworkError(_)
                | EmbeddingProviderError::Timeout
                | EmbeddingProviderError::RateLimitExceeded
                | EmbeddingProviderError::ServiceUnavailable(_)
        )
    }
}

impl std::fmt::Display for EmbeddingProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProviderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            EmbeddingProviderError::Timeout => write!(f, "Request timed out"),
            EmbeddingProviderError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            EmbeddingProviderError::ServiceUnavailable(msg) => {
                write!(f, "Service unavailable: {}", msg)
            }
            EmbeddingProviderError::Rejected(msg) => write!(f, "Request rejected: {}", msg),
            EmbeddingProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for EmbeddingProviderError {}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// One upstream request. Returns raw vectors in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingProviderError>;

    fn model_name(&self) -> &str;
}
