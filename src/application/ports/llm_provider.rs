use async_trait::async_trait;

#[derive(Debug)]
pub enum LlmError {
    NetworkError(String),
    Timeout,
    RateLimitExceeded,
    ServiceUnavailable(String),
    Rejected(String),
    InvalidResponse(String),
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::NetworkError(_)
                | LlmError::Timeout
                | LlmError::RateLimitExceeded
                | LlmError::ServiceUnavailable(_)
        )
    }
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            LlmError::Timeout => write!(f, "Request timed out"),
            LlmError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            LlmError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            LlmError::Rejected(msg) => write!(f, "Request rejected: {}", msg),
            LlmError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for LlmError {}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;

    fn model_name(&self) -> &str;
}
