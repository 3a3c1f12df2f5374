use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use futures::{StreamExt, TryStreamExt, stream};
use tokio::sync::Semaphore;

use crate::application::errors::KnowledgeError;
use crate::application::ports::{EmbeddingProvider, EmbeddingProviderError, Tokenizer};
use crate::application::services::retry_policy::RetryPolicy;
use crate::domain::value_objects::NormalizedVector;

#[derive(Debug, Clone, Copy)]
pub struct EmbeddingClientConfig {
    pub dimension: usize,
    pub batch_max: usize,
    pub batch_max_tokens: usize,
    pub concurrency: usize,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for EmbeddingClientConfig {
    fn default() -> Self {
        Self {
            dimension: 1536,
            batch_max: 64,
            batch_max_tokens: 8000,
            concurrency: 4,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Turns text into unit-norm vectors of the configured dimension.
///
/// Requests are batched by item count and token count, retried with backoff
/// on transient failures, and bounded process-wide by a semaphore. A
/// dimension mismatch from upstream is sticky: once seen, every later call
/// fails immediately.
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    tokenizer: Arc<dyn Tokenizer>,
    config: EmbeddingClientConfig,
    permits: Arc<Semaphore>,
    latched: AtomicBool,
    observed_dimension: AtomicUsize,
}

impl EmbeddingClient {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        tokenizer: Arc<dyn Tokenizer>,
        config: EmbeddingClientConfig,
    ) -> Self {
        Self {
            provider,
            tokenizer,
            permits: Arc::new(Semaphore::new(config.concurrency.max(1))),
            config,
            latched: AtomicBool::new(false),
            observed_dimension: AtomicUsize::new(0),
        }
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// False once upstream has returned vectors of the wrong dimension.
    pub fn is_healthy(&self) -> bool {
        !self.latched.load(Ordering::SeqCst)
    }

    pub async fn embed_one(&self, text: &str) -> Result<NormalizedVector, KnowledgeError> {
        let mut vectors = self.embed_many(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            KnowledgeError::EmbeddingUnavailable("upstream returned no vector".to_string())
        })
    }

    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<NormalizedVector>, KnowledgeError> {
        self.embed_many_with_progress(texts, |_, _| {}).await
    }

    /// Embeds `texts` preserving input order. `progress` receives
    /// `(embedded, total)` after each batch lands, in order.
    pub async fn embed_many_with_progress<P>(
        &self,
        texts: &[String],
        progress: P,
    ) -> Result<Vec<NormalizedVector>, KnowledgeError>
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        self.check_latch()?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let total = texts.len();
        let batches = self.plan_batches(texts);
        tracing::debug!("Embedding {} texts in {} batches", total, batches.len());

        let pending: Vec<_> = batches
            .into_iter()
            .map(|batch| self.embed_batch(batch))
            .collect();
        let mut results = stream::iter(pending).buffered(self.config.concurrency.max(1));

        let mut vectors = Vec::with_capacity(total);
        while let Some(batch) = results.try_next().await? {
            vectors.extend(batch);
            progress(vectors.len(), total);
        }

        Ok(vectors)
    }

    /// Greedy batching: a batch closes when adding the next text would exceed
    /// either limit. A single oversized text still gets its own batch.
    fn plan_batches<'a>(&self, texts: &'a [String]) -> Vec<&'a [String]> {
        let batch_max = self.config.batch_max.max(1);
        let mut batches = Vec::new();
        let mut start = 0;
        let mut tokens = 0;

        for (index, text) in texts.iter().enumerate() {
            let cost = self.tokenizer.count(text);
            let items = index - start;
            if items > 0 && (items >= batch_max || tokens + cost > self.config.batch_max_tokens) {
                batches.push(&texts[start..index]);
                start = index;
                tokens = 0;
            }
            tokens += cost;
        }
        batches.push(&texts[start..]);

        batches
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<NormalizedVector>, KnowledgeError> {
        let raw = self
            .config
            .retry
            .run(
                "Embedding request",
                EmbeddingProviderError::is_retryable,
                || self.request_once(batch),
            )
            .await
            .map_err(|e| {
                tracing::error!("Embedding request failed: {}", e);
                KnowledgeError::EmbeddingUnavailable(e.to_string())
            })?;

        if raw.len() != batch.len() {
            return Err(KnowledgeError::EmbeddingUnavailable(format!(
                "upstream returned {} vectors for {} inputs",
                raw.len(),
                batch.len()
            )));
        }

        raw.into_iter()
            .map(|values| {
                if values.len() != self.config.dimension {
                    return Err(self.latch(values.len()));
                }
                NormalizedVector::normalize(values)
                    .map_err(|e| KnowledgeError::EmbeddingUnavailable(e.to_string()))
            })
            .collect()
    }

    async fn request_once(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingProviderError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| EmbeddingProviderError::NetworkError(e.to_string()))?;

        tokio::time::timeout(self.config.timeout, self.provider.embed_batch(batch))
            .await
            .map_err(|_| EmbeddingProviderError::Timeout)?
    }

    fn latch(&self, actual: usize) -> KnowledgeError {
        self.observed_dimension.store(actual, Ordering::SeqCst);
        self.latched.store(true, Ordering::SeqCst);
        tracing::error!(
            "Embedding model returned dimension {}, expected {}; refusing further embedding calls",
            actual,
            self.config.dimension
        );
        KnowledgeError::EmbeddingDimMismatch {
            expected: self.config.dimension,
            actual,
        }
    }

    fn check_latch(&self) -> Result<(), KnowledgeError> {
        if !self.latched.load(Ordering::SeqCst) {
            return Ok(());
        }
        Err(KnowledgeError::EmbeddingDimMismatch {
            expected: self.config.dimension,
            actual: self.observed_dimension.load(Ordering::SeqCst),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{BagOfWordsEmbedder, WhitespaceTokenizer};
    use std::sync::Mutex;

    fn config(dimension: usize) -> EmbeddingClientConfig {
        EmbeddingClientConfig {
            dimension,
            batch_max: 3,
            batch_max_tokens: 10,
            concurrency: 2,
            timeout: Duration::from_secs(5),
            retry: RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
            },
        }
    }

    fn client(provider: Arc<BagOfWordsEmbedder>, dimension: usize) -> EmbeddingClient {
        EmbeddingClient::new(provider, Arc::new(WhitespaceTokenizer), config(dimension))
    }

    #[tokio::test]
    async fn test_vectors_are_unit_norm_and_ordered() {
        let provider = Arc::new(BagOfWordsEmbedder::new(16));
        let client = client(provider.clone(), 16);
        let texts: Vec<String> = (0..7).map(|i| format!("text number {}", i)).collect();

        let vectors = client.embed_many(&texts).await.unwrap();

        assert_eq!(vectors.len(), 7);
        for (text, vector) in texts.iter().zip(&vectors) {
            assert!((vector.norm() - 1.0).abs() < 1e-3);
            let expected = NormalizedVector::normalize(provider.vector_for(text)).unwrap();
            assert_eq!(vector, &expected);
        }
    }

    #[tokio::test]
    async fn test_batches_respect_item_and_token_limits() {
        let provider = Arc::new(BagOfWordsEmbedder::new(8));
        let client = client(provider.clone(), 8);
        // Three words each: a token limit of 10 allows three per batch.
        let mut texts: Vec<String> = (0..5).map(|i| format!("alpha beta {}", i)).collect();
        // Eight words: must travel alone.
        texts.push("one two three four five six seven eight".to_string());

        client.embed_many(&texts).await.unwrap();

        let mut sizes = provider.batch_sizes.lock().unwrap().clone();
        sizes.sort();
        assert_eq!(sizes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let provider = Arc::new(BagOfWordsEmbedder::new(8).failing_first(2));
        let client = client(provider.clone(), 8);

        let vector = client.embed_one("hello").await.unwrap();

        assert_eq!(vector.dimension(), 8);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_unavailable() {
        let provider = Arc::new(BagOfWordsEmbedder::new(8).failing_first(10));
        let client = client(provider.clone(), 8);

        let error = client.embed_one("hello").await.unwrap_err();

        assert_eq!(error.code(), "EMBEDDING_UNAVAILABLE");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_latches() {
        let provider = Arc::new(BagOfWordsEmbedder::new(12));
        let client = client(provider.clone(), 8);

        let first = client.embed_one("hello").await.unwrap_err();
        assert_eq!(first.code(), "EMBEDDING_DIM_MISMATCH");
        assert!(!client.is_healthy());

        let calls_before = provider.calls.load(Ordering::SeqCst);
        let second = client.embed_one("hello").await.unwrap_err();
        assert_eq!(second.code(), "EMBEDDING_DIM_MISMATCH");
        assert_eq!(provider.calls.load(Ordering::SeqCst), calls_before);
    }

    #[tokio::test]
    async fn test_empty_vectors_latch_as_mismatch() {
        let provider = Arc::new(BagOfWordsEmbedder::new(0));
        let client = client(provider.clone(), 8);

        let first = client.embed_one("hello").await.unwrap_err();
        assert_eq!(first.code(), "EMBEDDING_DIM_MISMATCH");
        assert!(!client.is_healthy());

        let calls_before = provider.calls.load(Ordering::SeqCst);
        let second = client.embed_one("hello").await.unwrap_err();
        assert!(matches!(
            second,
            KnowledgeError::EmbeddingDimMismatch { expected: 8, actual: 0 }
        ));
        assert_eq!(provider.calls.load(Ordering::SeqCst), calls_before);
    }

    #[tokio::test]
    async fn test_embedding_runs_on_spawned_task() {
        let provider = Arc::new(BagOfWordsEmbedder::new(8));
        let client = Arc::new(client(provider, 8));
        let texts: Vec<String> = (0..5).map(|i| format!("spawned text {}", i)).collect();

        let handle = tokio::spawn({
            let client = client.clone();
            async move { client.embed_many(&texts).await }
        });

        assert_eq!(handle.await.unwrap().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_progress_reports_each_batch() {
        let provider = Arc::new(BagOfWordsEmbedder::new(8));
        let client = client(provider, 8);
        let texts: Vec<String> = (0..7).map(|i| format!("t{}", i)).collect();
        let seen = Mutex::new(Vec::new());

        client
            .embed_many_with_progress(&texts, |done, total| {
                seen.lock().unwrap().push((done, total));
            })
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(3, 7), (6, 7), (7, 7)]);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let provider = Arc::new(BagOfWordsEmbedder::new(8));
        let client = client(provider.clone(), 8);

        assert!(client.embed_many(&[]).await.unwrap().is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
