//! Deterministic stand-ins for the external ports.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::application::ports::{
    CompletionRequest, EmbeddingProvider, EmbeddingProviderError, LlmError, LlmProvider, Tokenizer,
};

/// One token per whitespace-separated word.
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Hashes each lowercased word into a bucket, so texts sharing words score
/// high against each other.
pub struct BagOfWordsEmbedder {
    dimension: usize,
    pub calls: AtomicUsize,
    pub batch_sizes: Mutex<Vec<usize>>,
    transient_failures: AtomicUsize,
}

impl BagOfWordsEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
            transient_failures: AtomicUsize::new(0),
        }
    }

    /// The next `count` calls answer 429.
    pub fn failing_first(self, count: usize) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut values = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return values;
        }
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = fnv(&word.to_lowercase()) as usize % self.dimension;
            values[bucket] += 1.0;
        }
        values[self.dimension - 1] += 0.01;
        values
    }
}

fn fnv(word: &str) -> u64 {
    word.bytes().fold(0xcbf29ce484222325u64, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(EmbeddingProviderError::RateLimitExceeded);
        }

        self.batch_sizes.lock().unwrap().push(texts.len());
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }

    fn model_name(&self) -> &str {
        "bag-of-words"
    }
}

/// Counts invocations and replays a fixed outcome.
pub struct ScriptedLlm {
    reply: Option<String>,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        self.reply
            .clone()
            .ok_or_else(|| LlmError::ServiceUnavailable("scripted outage".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
