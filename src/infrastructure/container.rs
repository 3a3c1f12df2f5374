use std::sync::Arc;

use crate::{
    application::{
        KnowledgeError,
        ports::{DocumentExtractor, EmbeddingProvider, FileStorage, LlmProvider, Tokenizer},
        services::{
            Chunker, EmbeddingClient, IngestAdmission, IngestProgressRegistry, Ingestor, QaEngine,
        },
        use_cases::{
            AskQuestionUseCase, DeleteDocumentUseCase, GetDocumentUseCase, ListDocumentsUseCase,
        },
    },
    domain::repositories::{UploadStagingRepository, VectorStore},
    infrastructure::{
        config::{AppConfig, VectorBackend},
        database::{
            DatabaseError, create_connection_pool, get_connection_from_pool, prepare_schema,
            repositories::{PostgresUploadStagingRepository, PostgresVectorStore},
        },
        external_services::{
            InferenceClient, OpenAiEmbeddingProvider, OpenAiLlmProvider, TiktokenTokenizer,
            document_extractors::CompositeDocumentExtractor,
        },
        file_system::LocalFileStorage,
        memory::{InMemoryUploadStaging, InMemoryVectorStore},
        messaging::UploadReaper,
    },
    presentation::http::handlers::{
        AdminHandler, AskHandler, DocumentHandler, HealthHandler, UploadHandler,
    },
};

/// Builds every component once and shares it by `Arc`.
pub struct AppContainer {
    pub config: AppConfig,

    // Storage
    pub vector_store: Arc<dyn VectorStore>,
    pub upload_staging: Arc<dyn UploadStagingRepository>,
    pub file_storage: Arc<dyn FileStorage>,

    // Application Services
    pub embedding_client: Arc<EmbeddingClient>,
    pub ingestor: Arc<Ingestor>,
    pub qa_engine: Arc<QaEngine>,
    pub upload_reaper: Arc<UploadReaper>,

    // HTTP Handlers
    pub document_handler: Arc<DocumentHandler>,
    pub upload_handler: Arc<UploadHandler>,
    pub ask_handler: Arc<AskHandler>,
    pub admin_handler: Arc<AdminHandler>,
    pub health_handler: Arc<HealthHandler>,
}

impl AppContainer {
    pub async fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let tokenizer: Arc<dyn Tokenizer> =
            Arc::new(TiktokenTokenizer::for_model(&config.embedding.model)?);

        let embedding_provider: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbeddingProvider::new(
            InferenceClient::new(config.embedding.http.clone())?,
            config.embedding.model.clone(),
        ));
        let llm_provider: Arc<dyn LlmProvider> = Arc::new(OpenAiLlmProvider::new(
            InferenceClient::new(config.llm.http.clone())?,
            config.llm.model.clone(),
            config.llm_max_tokens,
        ));

        Self::with_providers(config, embedding_provider, llm_provider, tokenizer).await
    }

    /// Wires the container around the given upstream providers. The storage
    /// backend comes from `config`; a Postgres schema is migrated (or checked)
    /// and its vector dimension verified before anything is served.
    pub async fn with_providers(
        config: AppConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let (vector_store, upload_staging) = Self::storage(&config).await?;

        vector_store
            .verify_schema(config.embedding_client.dimension)
            .await
            .map_err(KnowledgeError::from)?;

        let local_storage = LocalFileStorage::new(config.upload_dir.clone());
        local_storage.ensure_directory_exists().await?;
        let file_storage: Arc<dyn FileStorage> = Arc::new(local_storage);

        let document_extractor: Arc<dyn DocumentExtractor> =
            Arc::new(CompositeDocumentExtractor::new());
        let chunker = Arc::new(Chunker::new(tokenizer.clone(), config.chunker)?);
        let embedding_client = Arc::new(EmbeddingClient::new(
            embedding_provider,
            tokenizer.clone(),
            config.embedding_client,
        ));

        let ingestor = Arc::new(Ingestor::new(
            document_extractor,
            chunker,
            embedding_client.clone(),
            vector_store.clone(),
            upload_staging.clone(),
            file_storage.clone(),
            Arc::new(IngestAdmission::new(config.ingest_queue_max)),
            Arc::new(IngestProgressRegistry::new()),
            config.ingestor,
        ));

        let qa_engine = Arc::new(QaEngine::new(
            embedding_client.clone(),
            vector_store.clone(),
            llm_provider,
            tokenizer,
            config.qa,
        ));

        let upload_reaper = Arc::new(UploadReaper::new(ingestor.clone(), config.reaper_interval));

        // Use cases
        let list_documents_use_case = Arc::new(ListDocumentsUseCase::new(vector_store.clone()));
        let get_document_use_case = Arc::new(GetDocumentUseCase::new(vector_store.clone()));
        let delete_document_use_case = Arc::new(DeleteDocumentUseCase::new(vector_store.clone()));
        let ask_question_use_case = Arc::new(AskQuestionUseCase::new(qa_engine.clone()));

        // HTTP handlers
        let document_handler = Arc::new(DocumentHandler::new(
            ingestor.clone(),
            list_documents_use_case,
            get_document_use_case,
            delete_document_use_case,
        ));
        let upload_handler = Arc::new(UploadHandler::new(ingestor.clone()));
        let ask_handler = Arc::new(AskHandler::new(ask_question_use_case));
        let admin_handler = Arc::new(AdminHandler::new(vector_store.clone()));
        let health_handler = Arc::new(HealthHandler::new(embedding_client.clone()));

        Ok(Self {
            config,
            vector_store,
            upload_staging,
            file_storage,
            embedding_client,
            ingestor,
            qa_engine,
            upload_reaper,
            document_handler,
            upload_handler,
            ask_handler,
            admin_handler,
            health_handler,
        })
    }

    async fn storage(
        config: &AppConfig,
    ) -> Result<(Arc<dyn VectorStore>, Arc<dyn UploadStagingRepository>), Box<dyn std::error::Error>>
    {
        match config.backend {
            VectorBackend::Memory => {
                tracing::warn!("Using the in-memory vector store; documents will not survive a restart");
                Ok((
                    Arc::new(InMemoryVectorStore::new(
                        config.store.dimension,
                        config.store.similarity_floor,
                    )),
                    Arc::new(InMemoryUploadStaging::new()),
                ))
            }
            VectorBackend::Postgres => {
                let database = config.database.clone().ok_or_else(|| {
                    DatabaseError::ConfigurationError("DATABASE_URL not set".to_string())
                })?;
                let pool = create_connection_pool(&database)?;

                let apply = config.run_migrations;
                let migration_pool = pool.clone();
                tokio::task::spawn_blocking(move || {
                    let mut conn = get_connection_from_pool(&migration_pool)?;
                    prepare_schema(&mut conn, apply)
                })
                .await??;

                Ok((
                    Arc::new(PostgresVectorStore::new(pool.clone(), config.store)),
                    Arc::new(PostgresUploadStagingRepository::new(pool)),
                ))
            }
        }
    }
}
