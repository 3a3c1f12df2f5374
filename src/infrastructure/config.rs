use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::application::services::{
    ChunkerConfig, EmbeddingClientConfig, IngestorConfig, QaEngineConfig, RetryPolicy,
};
use crate::infrastructure::database::DatabaseConfig;
use crate::infrastructure::database::repositories::PostgresVectorStoreConfig;
use crate::infrastructure::external_services::InferenceClientConfig;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { name: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} must be set", name),
            ConfigError::Invalid { name, reason } => write!(f, "{} is invalid: {}", name, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub model: String,
    pub http: InferenceClientConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub backend: VectorBackend,
    pub database: Option<DatabaseConfig>,
    pub run_migrations: bool,
    pub upload_dir: PathBuf,
    pub embedding: ProviderConfig,
    pub llm: ProviderConfig,
    pub llm_max_tokens: u32,
    pub embedding_client: EmbeddingClientConfig,
    pub chunker: ChunkerConfig,
    pub store: PostgresVectorStoreConfig,
    pub qa: QaEngineConfig,
    pub ingestor: IngestorConfig,
    pub ingest_queue_max: usize,
    pub reaper_interval: Duration,
}

/// Reads typed values out of a string lookup, naming the variable on failure.
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.raw(name).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.raw(name) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: format!("{:?}: {}", value, e),
            }),
        }
    }

    fn positive<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + Default,
        T::Err: std::fmt::Display,
    {
        let value = self.parse(name, default)?;
        if value <= T::default() {
            return Err(ConfigError::Invalid {
                name,
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    }

    fn flag(&self, name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.raw(name).map(|v| v.to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
            Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
            Some(v) => Err(ConfigError::Invalid {
                name,
                reason: format!("{:?} is not a boolean", v),
            }),
        }
    }

    fn score(&self, name: &'static str, default: f64) -> Result<f64, ConfigError> {
        let value = self.parse(name, default)?;
        if !(-1.0..=1.0).contains(&value) {
            return Err(ConfigError::Invalid {
                name,
                reason: format!("{} is outside [-1, 1]", value),
            });
        }
        Ok(value)
    }

    fn api_key(&self, name: &str) -> Option<String> {
        self.raw(name).or_else(|| self.raw("OPENAI_API_KEY"))
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let backend = match env.string("VECTOR_BACKEND", "postgres").to_ascii_lowercase().as_str() {
            "postgres" => VectorBackend::Postgres,
            "memory" => VectorBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "VECTOR_BACKEND",
                    reason: format!("{:?} is neither \"postgres\" nor \"memory\"", other),
                });
            }
        };

        let database = match backend {
            VectorBackend::Memory => None,
            VectorBackend::Postgres => Some(DatabaseConfig {
                url: env.raw("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                pool_size: env.positive("DB_POOL_SIZE", 10)?,
                statement_timeout: Duration::from_millis(
                    env.positive("DB_STATEMENT_TIMEOUT_MS", 30_000)?,
                ),
            }),
        };

        let dimension: usize = env.positive("EMBEDDING_DIM", 1536)?;
        let embed_timeout = Duration::from_secs(env.positive("EMBED_TIMEOUT_SECS", 30)?);
        let llm_timeout = Duration::from_secs(env.positive("LLM_TIMEOUT_SECS", 60)?);

        let embedding = ProviderConfig {
            model: env.string("EMBEDDING_MODEL", "text-embedding-3-small"),
            http: InferenceClientConfig {
                base_url: env.string("EMBEDDING_API_BASE", OPENAI_API_BASE),
                api_key: env.api_key("EMBEDDING_API_KEY"),
                timeout: embed_timeout,
            },
        };
        let llm = ProviderConfig {
            model: env.string("LLM_MODEL", "gpt-4o-mini"),
            http: InferenceClientConfig {
                base_url: env.string("LLM_API_BASE", OPENAI_API_BASE),
                api_key: env.api_key("LLM_API_KEY"),
                timeout: llm_timeout,
            },
        };

        let embedding_client = EmbeddingClientConfig {
            dimension,
            batch_max: env.positive("EMBED_BATCH_MAX", 64)?,
            batch_max_tokens: env.positive("EMBED_BATCH_MAX_TOKENS", 8000)?,
            concurrency: env.positive("EMBED_CONCURRENCY", 4)?,
            timeout: embed_timeout,
            retry: RetryPolicy {
                max_retries: env.parse("EMBED_MAX_RETRIES", 5)?,
                base_delay: Duration::from_millis(env.positive("EMBED_RETRY_BASE_MS", 500)?),
                ..RetryPolicy::default()
            },
        };

        let chunker = ChunkerConfig {
            min_tokens: env.parse("CHUNK_MIN_TOKENS", 64)?,
            max_tokens: env.positive("CHUNK_MAX_TOKENS", 512)?,
            overlap_tokens: env.parse("CHUNK_OVERLAP_TOKENS", 76)?,
        };
        if chunker.overlap_tokens >= chunker.max_tokens {
            return Err(ConfigError::Invalid {
                name: "CHUNK_OVERLAP_TOKENS",
                reason: format!("must be below CHUNK_MAX_TOKENS ({})", chunker.max_tokens),
            });
        }
        if chunker.min_tokens > chunker.max_tokens {
            return Err(ConfigError::Invalid {
                name: "CHUNK_MIN_TOKENS",
                reason: format!("must not exceed CHUNK_MAX_TOKENS ({})", chunker.max_tokens),
            });
        }

        let store = PostgresVectorStoreConfig {
            dimension,
            similarity_floor: env.score("SIMILARITY_FLOOR", 0.15)?,
            ivfflat_lists: env.positive("IVFFLAT_LISTS", 200)?,
            ivfflat_probes: env.positive("IVFFLAT_PROBES", 10)?,
        };

        let qa = QaEngineConfig {
            answer_floor: env.score("ANSWER_FLOOR", 0.20)?,
            prompt_token_budget: env.positive("PROMPT_TOKEN_BUDGET", 8000)?,
            llm_timeout,
            llm_retry: RetryPolicy {
                max_retries: env.parse("LLM_MAX_RETRIES", 2)?,
                ..RetryPolicy::default()
            },
        };

        let upload_ttl_secs: i64 = env.positive("UPLOAD_TTL_SECS", 86_400)?;
        let ingestor = IngestorConfig {
            max_upload_bytes: env.positive("MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?,
            upload_ttl: chrono::Duration::seconds(upload_ttl_secs),
        };

        Ok(Self {
            port: env.positive("PORT", 3000)?,
            backend,
            database,
            run_migrations: env.flag("RUN_MIGRATIONS", true)?,
            upload_dir: PathBuf::from(env.string("UPLOAD_DIR", "./uploads")),
            embedding,
            llm,
            llm_max_tokens: env.positive("LLM_MAX_TOKENS", 1024)?,
            embedding_client,
            chunker,
            store,
            qa,
            ingestor,
            ingest_queue_max: env.positive("INGEST_QUEUE_MAX", 16)?,
            reaper_interval: Duration::from_secs(env.positive("REAPER_INTERVAL_SECS", 300)?),
        })
    }

    /// One-line startup summary; never includes credentials.
    pub fn summary(&self) -> String {
        format!(
            "backend={:?} port={} embedding_model={} dim={} llm_model={} chunk_tokens={}..{} overlap={} \
             similarity_floor={} answer_floor={} embed_concurrency={} ingest_queue_max={}",
            self.backend,
            self.port,
            self.embedding.model,
            self.embedding_client.dimension,
            self.llm.model,
            self.chunker.min_tokens,
            self.chunker.max_tokens,
            self.chunker.overlap_tokens,
            self.store.similarity_floor,
            self.qa.answer_floor,
            self.embedding_client.concurrency,
            self.ingest_queue_max,
        )
    }
}
