use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::errors::KnowledgeError;
use crate::application::ports::{DocumentExtractor, FileStorage};
use crate::application::services::chunker::{Chunker, TextChunk};
use crate::application::services::embedding_client::EmbeddingClient;
use crate::application::services::ingest_admission::IngestAdmission;
use crate::application::services::ingest_progress::{
    IngestProgress, IngestProgressRegistry, IngestStage, ProgressHandle,
};
use crate::domain::entities::document::{MAX_SUMMARY_BYTES, truncate_to_bytes};
use crate::domain::entities::{Chunk, Document, UploadMeta, UploadStaging};
use crate::domain::repositories::{UploadStagingRepository, VectorStore};
use crate::domain::value_objects::{ContentChecksum, NormalizedVector};

#[derive(Debug, Clone, Copy)]
pub struct IngestorConfig {
    pub max_upload_bytes: u64,
    pub upload_ttl: chrono::Duration,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 50 * 1024 * 1024,
            upload_ttl: chrono::Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub data: Vec<u8>,
    pub mime: String,
    pub filename: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestReceipt {
    pub document_id: Uuid,
    pub filename: String,
    pub pages: Option<i32>,
    pub chunks: usize,
}

/// Runs upload -> extract -> chunk -> embed -> persist. Nothing is written
/// until the final single-transaction insert, so any earlier failure or a
/// dropped future leaves no document behind.
pub struct Ingestor {
    extractor: Arc<dyn DocumentExtractor>,
    chunker: Arc<Chunker>,
    embeddings: Arc<EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    staging: Arc<dyn UploadStagingRepository>,
    files: Arc<dyn FileStorage>,
    admission: Arc<IngestAdmission>,
    progress: Arc<IngestProgressRegistry>,
    claims: Arc<Mutex<HashMap<Uuid, UploadStaging>>>,
    config: IngestorConfig,
}

impl Ingestor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extractor: Arc<dyn DocumentExtractor>,
        chunker: Arc<Chunker>,
        embeddings: Arc<EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        staging: Arc<dyn UploadStagingRepository>,
        files: Arc<dyn FileStorage>,
        admission: Arc<IngestAdmission>,
        progress: Arc<IngestProgressRegistry>,
        config: IngestorConfig,
    ) -> Self {
        Self {
            extractor,
            chunker,
            embeddings,
            store,
            staging,
            files,
            admission,
            progress,
            claims: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestReceipt, KnowledgeError> {
        self.check_size(request.data.len() as u64)?;
        let _slot = self.admission.try_admit()?;
        let handle = self.progress.track(Uuid::new_v4());

        self.run_pipeline(request, &handle).await
    }

    /// First half of the two-phase flow: keep the payload and its metadata
    /// until `commit_upload` or expiry.
    pub async fn begin_upload(
        &self,
        data: Vec<u8>,
        mime: String,
        filename: String,
    ) -> Result<UploadStaging, KnowledgeError> {
        self.check_size(data.len() as u64)?;
        let format = self.extractor.detect_format(&data, &mime, &filename)?;

        let stored = self.files.store_file(&data).await?;
        let meta = UploadMeta {
            filename,
            mime,
            size_bytes: data.len() as i64,
            format,
            storage_key: stored.key,
        };
        let staging = UploadStaging::new(meta, self.config.upload_ttl);

        if let Err(e) = self.staging.save(&staging).await {
            let _ = self.files.delete_file(stored.key).await;
            return Err(e.into());
        }

        tracing::info!(
            "Staged upload {} ({}, {} bytes, expires {})",
            staging.upload_id(),
            staging.meta().format,
            staging.meta().size_bytes,
            staging.expires_at()
        );
        Ok(staging)
    }

    pub async fn commit_upload(
        &self,
        upload_id: Uuid,
        summary: Option<String>,
    ) -> Result<IngestReceipt, KnowledgeError> {
        let _slot = self.admission.try_admit()?;
        let claim = self.claim_upload(upload_id).await?;
        let handle = self.progress.track(upload_id);

        let outcome = self.ingest_staged(claim.staging(), summary, &handle).await;
        match outcome {
            Ok(receipt) => {
                let storage_key = claim.staging().meta().storage_key;
                claim.finish();
                if let Err(e) = self.files.delete_file(storage_key).await {
                    tracing::warn!(
                        "Failed to delete payload {} of committed upload {}: {}",
                        storage_key,
                        upload_id,
                        e
                    );
                }
                Ok(receipt)
            }
            Err(e) => {
                claim.release().await;
                Err(e)
            }
        }
    }

    async fn ingest_staged(
        &self,
        staging: &UploadStaging,
        summary: Option<String>,
        handle: &ProgressHandle,
    ) -> Result<IngestReceipt, KnowledgeError> {
        let meta = staging.meta().clone();
        let data = self.files.retrieve_file(meta.storage_key).await?;
        let request = IngestRequest {
            data,
            mime: meta.mime,
            filename: meta.filename,
            summary,
        };
        self.run_pipeline(request, handle).await
    }

    /// Takes the upload out of staging so no other commit can see it. An
    /// expired upload is discarded instead.
    async fn claim_upload(&self, upload_id: Uuid) -> Result<UploadClaim, KnowledgeError> {
        let staging = self
            .staging
            .take(upload_id)
            .await?
            .ok_or_else(|| KnowledgeError::upload_not_found(upload_id))?;

        if staging.is_expired_at(Utc::now()) {
            if let Err(e) = self.files.delete_file(staging.meta().storage_key).await {
                tracing::warn!("Failed to delete payload of expired upload {}: {}", upload_id, e);
            }
            return Err(KnowledgeError::upload_not_found(upload_id));
        }

        if let Ok(mut claims) = self.claims.lock() {
            claims.insert(upload_id, staging.clone());
        }
        Ok(UploadClaim {
            staging,
            settled: false,
            repository: self.staging.clone(),
            claims: self.claims.clone(),
        })
    }

    pub async fn upload_status(
        &self,
        upload_id: Uuid,
    ) -> Result<(UploadStaging, Option<IngestProgress>), KnowledgeError> {
        let staging = self.live_upload(upload_id).await?;
        Ok((staging, self.progress.get(upload_id)))
    }

    /// Deletes expired staging rows and their payloads. Returns how many
    /// uploads were removed.
    pub async fn reap_expired_uploads(&self, now: DateTime<Utc>) -> Result<usize, KnowledgeError> {
        let expired = self.staging.find_expired(now).await?;
        let mut reaped = 0;
        for staging in &expired {
            match self.discard_upload(staging).await {
                Ok(()) => reaped += 1,
                Err(e) => tracing::warn!(
                    "Failed to reap upload {}: {}",
                    staging.upload_id(),
                    e
                ),
            }
        }
        Ok(reaped)
    }

    async fn run_pipeline(
        &self,
        request: IngestRequest,
        handle: &ProgressHandle,
    ) -> Result<IngestReceipt, KnowledgeError> {
        let started = Instant::now();
        let IngestRequest {
            data,
            mime,
            filename,
            summary,
        } = request;
        tracing::info!("Ingest started: {} ({} bytes)", filename, data.len());

        handle.stage(IngestStage::Extracting);
        let size_bytes = data.len() as i64;
        let checksum = ContentChecksum::of(&data);
        let format = self.extractor.detect_format(&data, &mime, &filename)?;
        let extracted = self.extractor.extract(data, format).await?;

        handle.stage(IngestStage::Chunking);
        let chunker = self.chunker.clone();
        let text = extracted.text;
        let pieces = tokio::task::spawn_blocking(move || chunker.split(&text))
            .await
            .map_err(|e| KnowledgeError::InternalInvariantViolated(e.to_string()))?;
        if pieces.is_empty() {
            return Err(KnowledgeError::EmptyExtraction);
        }

        let contents: Vec<String> = pieces.iter().map(|p| p.content.clone()).collect();
        handle.embedded(0, contents.len());
        let vectors = self
            .embeddings
            .embed_many_with_progress(&contents, |done, total| handle.embedded(done, total))
            .await?;
        if vectors.len() != pieces.len() {
            return Err(KnowledgeError::InternalInvariantViolated(format!(
                "{} embeddings for {} chunks",
                vectors.len(),
                pieces.len()
            )));
        }

        handle.stage(IngestStage::Persisting);
        let summary = summary
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| leading_sentences(pieces[0].fresh_text(), 2));
        let mime = if mime.trim().is_empty() {
            format.canonical_mime().to_string()
        } else {
            mime
        };
        let pages = if format.reports_pages() { extracted.pages } else { None };
        let document = Document::new(
            filename,
            mime,
            size_bytes,
            pages,
            summary,
            Some(checksum),
        );

        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(index, (piece, vector))| to_chunk(document.id(), index, piece, vector))
            .collect();

        self.store.insert_document(&document, &chunks).await?;

        tracing::info!(
            "Ingest finished: document {} ({}, {} chunks) in {} ms",
            document.id(),
            document.filename(),
            chunks.len(),
            started.elapsed().as_millis()
        );

        Ok(IngestReceipt {
            document_id: document.id(),
            filename: document.filename().to_string(),
            pages: document.pages(),
            chunks: chunks.len(),
        })
    }

    fn check_size(&self, size: u64) -> Result<(), KnowledgeError> {
        if size > self.config.max_upload_bytes {
            return Err(KnowledgeError::PayloadTooLarge {
                size,
                limit: self.config.max_upload_bytes,
            });
        }
        Ok(())
    }

    async fn live_upload(&self, upload_id: Uuid) -> Result<UploadStaging, KnowledgeError> {
        let claimed = self
            .claims
            .lock()
            .ok()
            .and_then(|claims| claims.get(&upload_id).cloned());
        if let Some(staging) = claimed {
            return Ok(staging);
        }

        match self.staging.find(upload_id).await? {
            Some(staging) if !staging.is_expired_at(Utc::now()) => Ok(staging),
            _ => Err(KnowledgeError::upload_not_found(upload_id)),
        }
    }

    async fn discard_upload(&self, staging: &UploadStaging) -> Result<(), KnowledgeError> {
        self.files.delete_file(staging.meta().storage_key).await?;
        self.staging.delete(staging.upload_id()).await?;
        Ok(())
    }
}

/// An upload held out of staging by one running commit. Unless finished, it
/// goes back to staging when released, or when dropped by a cancelled commit.
struct UploadClaim {
    staging: UploadStaging,
    settled: bool,
    repository: Arc<dyn UploadStagingRepository>,
    claims: Arc<Mutex<HashMap<Uuid, UploadStaging>>>,
}

impl UploadClaim {
    fn staging(&self) -> &UploadStaging {
        &self.staging
    }

    fn finish(mut self) {
        self.settled = true;
    }

    async fn release(mut self) {
        self.settled = true;
        if let Err(e) = self.repository.save(&self.staging).await {
            tracing::warn!(
                "Failed to return upload {} to staging: {}",
                self.staging.upload_id(),
                e
            );
        }
    }
}

impl Drop for UploadClaim {
    fn drop(&mut self) {
        if let Ok(mut claims) = self.claims.lock() {
            claims.remove(&self.staging.upload_id());
        }
        if self.settled {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Upload {} dropped outside a runtime", self.staging.upload_id());
            return;
        };
        let repository = self.repository.clone();
        let staging = self.staging.clone();
        runtime.spawn(async move {
            if let Err(e) = repository.save(&staging).await {
                tracing::warn!(
                    "Failed to return upload {} to staging: {}",
                    staging.upload_id(),
                    e
                );
            }
        });
    }
}

fn to_chunk(
    document_id: Uuid,
    index: usize,
    piece: TextChunk,
    vector: NormalizedVector,
) -> Chunk {
    Chunk::new(
        document_id,
        index as i32,
        piece.content,
        piece.token_count as i32,
        vector,
    )
}

/// The first `count` sentences of `text` with whitespace collapsed, or the
/// whole text when it has fewer.
fn leading_sentences(text: &str, count: usize) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    let mut found = 0;
    let mut end = collapsed.len();
    let mut chars = collapsed.char_indices().peekable();
    while let Some((position, c)) = chars.next() {
        let terminal = matches!(c, '.' | '!' | '?' | '。');
        let at_break = c == '。' || chars.peek().is_none_or(|(_, next)| *next == ' ');
        if terminal && at_break {
            found += 1;
            if found == count {
                end = position + c.len_utf8();
                break;
            }
        }
    }

    let mut summary = collapsed[..end].to_string();
    if summary.len() > MAX_SUMMARY_BYTES {
        summary = truncate_to_bytes(&summary, MAX_SUMMARY_BYTES);
    }
    Some(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::chunker::ChunkerConfig;
    use crate::application::services::embedding_client::EmbeddingClientConfig;
    use crate::application::testing::{BagOfWordsEmbedder, WhitespaceTokenizer};
    use crate::domain::entities::SearchHit;
    use crate::domain::repositories::VectorStoreError;
    use crate::infrastructure::external_services::document_extractors::CompositeDocumentExtractor;
    use crate::infrastructure::file_system::LocalFileStorage;
    use crate::infrastructure::memory::{InMemoryUploadStaging, InMemoryVectorStore};
    use async_trait::async_trait;

    const DIM: usize = 32;

    struct Fixture {
        ingestor: Ingestor,
        store: Arc<InMemoryVectorStore>,
        staging: Arc<InMemoryUploadStaging>,
        _dir: tempfile::TempDir,
    }

    fn fixture_with(
        store: Arc<dyn VectorStore>,
        max_upload_bytes: u64,
        queue: usize,
    ) -> (Ingestor, Arc<InMemoryUploadStaging>, tempfile::TempDir) {
        let tokenizer = Arc::new(WhitespaceTokenizer);
        let chunker = Chunker::new(
            tokenizer.clone(),
            ChunkerConfig {
                min_tokens: 8,
                max_tokens: 32,
                overlap_tokens: 4,
            },
        )
        .unwrap();
        let embeddings = EmbeddingClient::new(
            Arc::new(BagOfWordsEmbedder::new(DIM)),
            tokenizer,
            EmbeddingClientConfig {
                dimension: DIM,
                ..EmbeddingClientConfig::default()
            },
        );
        let staging = Arc::new(InMemoryUploadStaging::new());
        let dir = tempfile::tempdir().unwrap();

        let ingestor = Ingestor::new(
            Arc::new(CompositeDocumentExtractor::new()),
            Arc::new(chunker),
            Arc::new(embeddings),
            store,
            staging.clone(),
            Arc::new(LocalFileStorage::new(dir.path().to_path_buf())),
            Arc::new(IngestAdmission::new(queue)),
            Arc::new(IngestProgressRegistry::new()),
            IngestorConfig {
                max_upload_bytes,
                upload_ttl: chrono::Duration::hours(24),
            },
        );
        (ingestor, staging, dir)
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryVectorStore::new(DIM, 0.15));
        let (ingestor, staging, dir) = fixture_with(store.clone(), 1024 * 1024, 4);
        Fixture {
            ingestor,
            store,
            staging,
            _dir: dir,
        }
    }

    fn text_request(text: &str) -> IngestRequest {
        IngestRequest {
            data: text.as_bytes().to_vec(),
            mime: "text/plain".to_string(),
            filename: "notes.txt".to_string(),
            summary: None,
        }
    }

    fn long_text() -> String {
        (0..60)
            .map(|i| format!("Sentence {} covers floor cleaning schedule item {}.", i, i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[tokio::test]
    async fn test_ingest_persists_document_and_chunks() {
        let fx = fixture();

        let receipt = fx.ingestor.ingest(text_request(&long_text())).await.unwrap();

        assert!(receipt.chunks > 1);
        assert_eq!(receipt.pages, None);
        let document = fx.store.get_document(receipt.document_id).await.unwrap();
        assert_eq!(document.filename(), "notes.txt");
        assert_eq!(
            document.summary(),
            Some("Sentence 0 covers floor cleaning schedule item 0. Sentence 1 covers floor cleaning schedule item 1.")
        );
        assert_eq!(document.checksum(), Some(&ContentChecksum::of(long_text().as_bytes())));
        assert_eq!(
            fx.store.chunk_count(receipt.document_id).await.unwrap(),
            receipt.chunks as i64
        );
    }

    #[tokio::test]
    async fn test_explicit_summary_wins() {
        let fx = fixture();
        let mut request = text_request(&long_text());
        request.summary = Some("  Cleaning rota.  ".to_string());

        let receipt = fx.ingestor.ingest(request).await.unwrap();

        let document = fx.store.get_document(receipt.document_id).await.unwrap();
        assert_eq!(document.summary(), Some("Cleaning rota."));
    }

    #[tokio::test]
    async fn test_reupload_creates_new_document() {
        let fx = fixture();

        let first = fx.ingestor.ingest(text_request("same bytes here")).await.unwrap();
        let second = fx.ingestor.ingest(text_request("same bytes here")).await.unwrap();

        assert_ne!(first.document_id, second.document_id);
        assert_eq!(fx.store.list_documents(0, 10).await.unwrap().1, 2);
    }

    #[tokio::test]
    async fn test_oversized_payload_rejected() {
        let store = Arc::new(InMemoryVectorStore::new(DIM, 0.15));
        let (ingestor, _staging, _dir) = fixture_with(store.clone(), 16, 4);

        let error = ingestor
            .ingest(text_request("this payload is longer than sixteen bytes"))
            .await
            .unwrap_err();

        assert_eq!(error.code(), "PAYLOAD_TOO_LARGE");
        assert_eq!(store.list_documents(0, 10).await.unwrap().1, 0);
    }

    #[tokio::test]
    async fn test_blank_text_is_empty_extraction() {
        let fx = fixture();

        let error = fx.ingestor.ingest(text_request(" \n\n \t")).await.unwrap_err();

        assert_eq!(error.code(), "EMPTY_EXTRACTION");
        assert_eq!(fx.store.list_documents(0, 10).await.unwrap().1, 0);
    }

    #[tokio::test]
    async fn test_overloaded_when_queue_full() {
        let store = Arc::new(InMemoryVectorStore::new(DIM, 0.15));
        let (ingestor, _staging, _dir) = fixture_with(store, 1024, 1);
        let _held = ingestor.admission.try_admit().unwrap();

        let error = ingestor.ingest(text_request("hello")).await.unwrap_err();

        assert_eq!(error.code(), "OVERLOADED");
    }

    struct FailingStore {
        inner: InMemoryVectorStore,
    }

    #[async_trait]
    impl VectorStore for FailingStore {
        async fn insert_document(&self, _: &Document, _: &[Chunk]) -> Result<(), VectorStoreError> {
            Err(VectorStoreError::Unavailable("connection reset".into()))
        }
        async fn delete_document(&self, id: Uuid) -> Result<bool, VectorStoreError> {
            self.inner.delete_document(id).await
        }
        async fn get_document(&self, id: Uuid) -> Result<Document, VectorStoreError> {
            self.inner.get_document(id).await
        }
        async fn chunk_count(&self, id: Uuid) -> Result<i64, VectorStoreError> {
            self.inner.chunk_count(id).await
        }
        async fn list_documents(&self, o: i64, l: i64) -> Result<(Vec<Document>, i64), VectorStoreError> {
            self.inner.list_documents(o, l).await
        }
        async fn search(
            &self,
            q: &NormalizedVector,
            k: usize,
            ids: Option<&[Uuid]>,
        ) -> Result<Vec<SearchHit>, VectorStoreError> {
            self.inner.search(q, k, ids).await
        }
        async fn rebuild_index(&self) -> Result<u32, VectorStoreError> {
            self.inner.rebuild_index().await
        }
        async fn verify_schema(&self, dimension: usize) -> Result<(), VectorStoreError> {
            self.inner.verify_schema(dimension).await
        }
    }

    #[tokio::test]
    async fn test_persist_failure_leaves_nothing() {
        let store = Arc::new(FailingStore {
            inner: InMemoryVectorStore::new(DIM, 0.15),
        });
        let (ingestor, _staging, _dir) = fixture_with(store.clone(), 1024 * 1024, 4);

        let error = ingestor.ingest(text_request(&long_text())).await.unwrap_err();

        assert_eq!(error.code(), "STORAGE_UNAVAILABLE");
        assert_eq!(store.list_documents(0, 10).await.unwrap().1, 0);
        assert_eq!(ingestor.admission.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_two_phase_upload() {
        let fx = fixture();

        let staged = fx
            .ingestor
            .begin_upload(long_text().into_bytes(), "text/plain".into(), "big.txt".into())
            .await
            .unwrap();
        let (status, progress) = fx.ingestor.upload_status(staged.upload_id()).await.unwrap();
        assert_eq!(status.meta().filename, "big.txt");
        assert!(progress.is_none());

        let receipt = fx
            .ingestor
            .commit_upload(staged.upload_id(), Some("Big file".into()))
            .await
            .unwrap();

        assert_eq!(receipt.filename, "big.txt");
        assert!(fx.store.get_document(receipt.document_id).await.is_ok());
        assert!(fx.staging.find(staged.upload_id()).await.unwrap().is_none());

        let again = fx.ingestor.commit_upload(staged.upload_id(), None).await;
        assert_eq!(again.unwrap_err().code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_concurrent_commits_ingest_once() {
        let fx = fixture();
        let staged = fx
            .ingestor
            .begin_upload(long_text().into_bytes(), "text/plain".into(), "once.txt".into())
            .await
            .unwrap();
        let id = staged.upload_id();

        let (first, second) = tokio::join!(
            fx.ingestor.commit_upload(id, None),
            fx.ingestor.commit_upload(id, None)
        );

        let (committed, rejected): (Vec<_>, Vec<_>) =
            [first, second].into_iter().partition(|result| result.is_ok());
        assert_eq!(committed.len(), 1);
        assert_eq!(rejected[0].as_ref().unwrap_err().code(), "NOT_FOUND");
        assert_eq!(fx.store.list_documents(0, 10).await.unwrap().1, 1);
        assert!(fx.staging.find(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_commit_returns_upload_to_staging() {
        let store = Arc::new(FailingStore {
            inner: InMemoryVectorStore::new(DIM, 0.15),
        });
        let (ingestor, staging, _dir) = fixture_with(store, 1024 * 1024, 4);
        let staged = ingestor
            .begin_upload(long_text().into_bytes(), "text/plain".into(), "retry.txt".into())
            .await
            .unwrap();

        let error = ingestor.commit_upload(staged.upload_id(), None).await.unwrap_err();

        assert_eq!(error.code(), "STORAGE_UNAVAILABLE");
        assert_eq!(staging.find(staged.upload_id()).await.unwrap(), Some(staged.clone()));
        assert!(ingestor.files.retrieve_file(staged.meta().storage_key).await.is_ok());
        let (status, progress) = ingestor.upload_status(staged.upload_id()).await.unwrap();
        assert_eq!(status.upload_id(), staged.upload_id());
        assert!(progress.is_none());
    }

    #[tokio::test]
    async fn test_reaper_removes_expired_uploads() {
        let fx = fixture();
        let staged = fx
            .ingestor
            .begin_upload(b"short lived".to_vec(), "text/plain".into(), "tmp.txt".into())
            .await
            .unwrap();

        let none = fx.ingestor.reap_expired_uploads(Utc::now()).await.unwrap();
        assert_eq!(none, 0);

        let later = Utc::now() + chrono::Duration::hours(25);
        let reaped = fx.ingestor.reap_expired_uploads(later).await.unwrap();
        assert_eq!(reaped, 1);
        assert!(fx.staging.find(staged.upload_id()).await.unwrap().is_none());
        assert!(fx.ingestor.files.retrieve_file(staged.meta().storage_key).await.is_err());
    }

    #[test]
    fn test_leading_sentences() {
        assert_eq!(
            leading_sentences("One.  Two!\nThree?", 2),
            Some("One. Two!".to_string())
        );
        assert_eq!(leading_sentences("No terminator", 2), Some("No terminator".to_string()));
        assert_eq!(leading_sentences("Version 1.5 ships. Then", 1), Some("Version 1.5 ships.".to_string()));
        assert_eq!(leading_sentences("   ", 2), None);
    }
}
