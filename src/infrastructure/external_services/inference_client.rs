use reqwest::{Client, Error as ReqwestError, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest slice of an upstream error body kept in error messages.
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Clone)]
pub struct InferenceClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Failure of one upstream call, classified by what a caller can do about it.
#[derive(Debug)]
pub enum InferenceError {
    RequestError(String),
    Timeout,
    RateLimited,
    ServerError(StatusCode, String),
    ClientError(StatusCode, String),
    ParseError(String),
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceError::RequestError(msg) => write!(f, "Request error: {}", msg),
            InferenceError::Timeout => write!(f, "Request timed out"),
            InferenceError::RateLimited => write!(f, "Rate limited (HTTP 429)"),
            InferenceError::ServerError(status, body) => write!(f, "HTTP {}: {}", status, body),
            InferenceError::ClientError(status, body) => write!(f, "HTTP {}: {}", status, body),
            InferenceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for InferenceError {}

/// JSON-over-HTTP client for OpenAI-compatible endpoints. Makes exactly one
/// attempt per call; retries belong to the caller.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    config: InferenceClientConfig,
}

impl InferenceClient {
    pub fn new(config: InferenceClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, InferenceError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::Timeout
            } else {
                InferenceError::RequestError(e.without_url().to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(InferenceError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let excerpt: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(if status.is_server_error() {
                InferenceError::ServerError(status, excerpt)
            } else {
                InferenceError::ClientError(status, excerpt)
            });
        }

        response.json::<Resp>().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::Timeout
            } else {
                InferenceError::ParseError(e.without_url().to_string())
            }
        })
    }
}
