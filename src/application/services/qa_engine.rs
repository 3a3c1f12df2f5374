use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::application::errors::KnowledgeError;
use crate::application::ports::{CompletionRequest, LlmError, LlmProvider, Tokenizer};
use crate::application::services::embedding_client::EmbeddingClient;
use crate::application::services::retry_policy::RetryPolicy;
use crate::domain::entities::{Answer, Citation, REFUSAL_TEXT, SearchHit};
use crate::domain::repositories::VectorStore;

const SYSTEM_INSTRUCTION: &str = "You answer questions strictly from the numbered context \
passages supplied with each question. Do not use outside knowledge and do not invent facts, \
names or figures. Refer to passages by their [n] number when you rely on them. If the passages \
do not contain the answer, reply exactly: ";

#[derive(Debug, Clone, Copy)]
pub struct QaEngineConfig {
    pub answer_floor: f64,
    pub prompt_token_budget: usize,
    pub llm_timeout: Duration,
    pub llm_retry: RetryPolicy,
}

impl Default for QaEngineConfig {
    fn default() -> Self {
        Self {
            answer_floor: 0.20,
            prompt_token_budget: 8000,
            llm_timeout: Duration::from_secs(60),
            llm_retry: RetryPolicy {
                max_retries: 2,
                ..RetryPolicy::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub text: String,
    pub k: usize,
    pub document_ids: Option<Vec<Uuid>>,
    pub temperature: f32,
}

/// Retrieval-grounded question answering.
pub struct QaEngine {
    embeddings: Arc<EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmProvider>,
    tokenizer: Arc<dyn Tokenizer>,
    config: QaEngineConfig,
}

impl QaEngine {
    pub fn new(
        embeddings: Arc<EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmProvider>,
        tokenizer: Arc<dyn Tokenizer>,
        config: QaEngineConfig,
    ) -> Self {
        Self {
            embeddings,
            store,
            llm,
            tokenizer,
            config,
        }
    }

    pub async fn answer(&self, question: Question) -> Result<Answer, KnowledgeError> {
        let query = self.embeddings.embed_one(&question.text).await?;
        let hits = self
            .store
            .search(&query, question.k, question.document_ids.as_deref())
            .await?;

        let top_score = hits.first().map(|hit| hit.score);
        if top_score.is_none_or(|score| score < self.config.answer_floor) {
            tracing::info!(
                "No grounding for question (top score {:?}); refusing without LLM call",
                top_score
            );
            return Ok(Answer::refusal());
        }

        let (user_prompt, used) = self.fit_prompt(&question.text, hits)?;
        let citations: Vec<Citation> = used.iter().map(SearchHit::citation).collect();

        let request = CompletionRequest {
            system: system_instruction(),
            user: user_prompt,
            temperature: question.temperature,
        };

        match self.complete(request).await {
            Ok(text) => Ok(Answer::grounded(text, citations)),
            Err(e) => {
                tracing::error!("LLM call failed after retries: {}", e);
                Ok(Answer::llm_unavailable(citations))
            }
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.config
            .llm_retry
            .run("LLM completion", LlmError::is_retryable, move || {
                let request = request.clone();
                async move {
                    tokio::time::timeout(self.config.llm_timeout, self.llm.complete(request))
                        .await
                        .map_err(|_| LlmError::Timeout)?
                }
            })
            .await
    }

    /// Drops the lowest-scoring hits until the prompt fits the token budget.
    /// A single remaining hit is trimmed instead of dropped.
    fn fit_prompt(
        &self,
        question: &str,
        mut hits: Vec<SearchHit>,
    ) -> Result<(String, Vec<SearchHit>), KnowledgeError> {
        let budget = self.config.prompt_token_budget;
        let system_tokens = self.tokenizer.count(&system_instruction());

        loop {
            let prompt = build_user_prompt(question, &hits);
            let total = system_tokens + self.tokenizer.count(&prompt);
            if total <= budget {
                return Ok((prompt, hits));
            }
            if hits.len() > 1 {
                let dropped = hits.pop();
                tracing::debug!(
                    "Prompt at {} tokens exceeds budget {}; dropping hit with score {:?}",
                    total,
                    budget,
                    dropped.map(|h| h.score)
                );
                continue;
            }

            let mut only = hits.pop().ok_or_else(|| {
                KnowledgeError::InternalInvariantViolated("prompt fitting ran out of hits".into())
            })?;
            let frame = system_tokens
                + self
                    .tokenizer
                    .count(&build_user_prompt(question, std::slice::from_ref(&SearchHit {
                        content: String::new(),
                        ..only.clone()
                    })));
            if frame >= budget {
                return Err(KnowledgeError::Validation(format!(
                    "question does not fit the prompt budget of {} tokens",
                    budget
                )));
            }
            let keep = self.tokenizer.prefix_len(&only.content, budget - frame);
            only.content.truncate(keep);
            let prompt = build_user_prompt(question, std::slice::from_ref(&only));
            return Ok((prompt, vec![only]));
        }
    }
}

fn system_instruction() -> String {
    format!("{}{}", SYSTEM_INSTRUCTION, REFUSAL_TEXT)
}

fn build_user_prompt(question: &str, hits: &[SearchHit]) -> String {
    let mut prompt = String::from("Context passages:\n\n");
    for (n, hit) in hits.iter().enumerate() {
        prompt.push_str(&format!(
            "[{}] (doc={}, chunk={}, score={:.4})\n{}\n\n",
            n + 1,
            hit.document_id,
            hit.chunk_index,
            hit.score,
            hit.content
        ));
    }
    prompt.push_str("Question: ");
    prompt.push_str(question);
    prompt
}
