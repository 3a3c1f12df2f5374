use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::chunk::validate_chunk_set;
use crate::domain::entities::{Chunk, Document, SearchHit};
use crate::domain::repositories::{VectorStore, VectorStoreError};
use crate::domain::value_objects::NormalizedVector;

#[derive(Default)]
struct Index {
    documents: HashMap<Uuid, Document>,
    chunks: HashMap<Uuid, Vec<Chunk>>,
}

/// Non-durable store with exact brute-force search. Ordering and floor
/// semantics match the Postgres store.
pub struct InMemoryVectorStore {
    index: RwLock<Index>,
    dimension: usize,
    similarity_floor: f64,
}

impl InMemoryVectorStore {
    pub fn new(dimension: usize, similarity_floor: f64) -> Self {
        Self {
            index: RwLock::new(Index::default()),
            dimension,
            similarity_floor,
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert_document(
        &self,
        document: &Document,
        chunks: &[Chunk],
    ) -> Result<(), VectorStoreError> {
        validate_chunk_set(document.id(), chunks, self.dimension)
            .map_err(VectorStoreError::InvalidData)?;

        let mut index = self.index.write().await;
        if index.documents.contains_key(&document.id()) {
            return Err(VectorStoreError::Conflict(format!(
                "Document {} already exists",
                document.id()
            )));
        }

        index.documents.insert(document.id(), document.clone());
        index.chunks.insert(document.id(), chunks.to_vec());
        Ok(())
    }

    async fn delete_document(&self, document_id: Uuid) -> Result<bool, VectorStoreError> {
        let mut index = self.index.write().await;
        index.chunks.remove(&document_id);
        Ok(index.documents.remove(&document_id).is_some())
    }

    async fn get_document(&self, document_id: Uuid) -> Result<Document, VectorStoreError> {
        self.index
            .read()
            .await
            .documents
            .get(&document_id)
            .cloned()
            .ok_or(VectorStoreError::NotFound(document_id))
    }

    async fn chunk_count(&self, document_id: Uuid) -> Result<i64, VectorStoreError> {
        let index = self.index.read().await;
        Ok(index.chunks.get(&document_id).map_or(0, |c| c.len() as i64))
    }

    async fn list_documents(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Document>, i64), VectorStoreError> {
        let index = self.index.read().await;
        let mut documents: Vec<Document> = index.documents.values().cloned().collect();
        documents.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then(a.id().cmp(&b.id()))
        });

        let total = documents.len() as i64;
        let page = documents
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn search(
        &self,
        query: &NormalizedVector,
        k: usize,
        document_ids: Option<&[Uuid]>,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        if query.dimension() != self.dimension {
            return Err(VectorStoreError::DimMismatch {
                expected: self.dimension,
                actual: query.dimension(),
            });
        }

        let index = self.index.read().await;
        let mut hits: Vec<SearchHit> = index
            .chunks
            .iter()
            .filter(|(document_id, _)| document_ids.is_none_or(|ids| ids.contains(*document_id)))
            .flat_map(|(_, chunks)| chunks.iter())
            .map(|chunk| SearchHit {
                chunk_id: chunk.id(),
                document_id: chunk.document_id(),
                chunk_index: chunk.chunk_index(),
                content: chunk.content().to_string(),
                score: query.dot(chunk.embedding()),
            })
            .filter(|hit| hit.score >= self.similarity_floor)
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.document_id.cmp(&b.document_id))
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn rebuild_index(&self) -> Result<u32, VectorStoreError> {
        // Exact search needs no index; taking the write lock still orders the
        // call after in-flight writes.
        let _guard = self.index.write().await;
        Ok(0)
    }

    async fn verify_schema(&self, dimension: usize) -> Result<(), VectorStoreError> {
        if dimension != self.dimension {
            return Err(VectorStoreError::DimMismatch {
                expected: dimension,
                actual: self.dimension,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(values: &[f32]) -> NormalizedVector {
        NormalizedVector::normalize(values.to_vec()).unwrap()
    }

    fn document(name: &str) -> Document {
        Document::new(name.into(), "text/plain".into(), 10, None, None, None)
    }

    fn chunks_for(document: &Document, vectors: &[&[f32]]) -> Vec<Chunk> {
        vectors
            .iter()
            .enumerate()
            .map(|(i, v)| Chunk::new(document.id(), i as i32, format!("chunk {}", i), 2, unit(v)))
            .collect()
    }

    #[tokio::test]
    async fn test_insert_get_delete() {
        let store = InMemoryVectorStore::new(2, 0.15);
        let doc = document("a.txt");
        store
            .insert_document(&doc, &chunks_for(&doc, &[&[1.0, 0.0], &[0.0, 1.0]]))
            .await
            .unwrap();

        assert_eq!(store.get_document(doc.id()).await.unwrap().id(), doc.id());
        assert_eq!(store.chunk_count(doc.id()).await.unwrap(), 2);

        assert!(store.delete_document(doc.id()).await.unwrap());
        assert!(!store.delete_document(doc.id()).await.unwrap());
        assert_eq!(store.chunk_count(doc.id()).await.unwrap(), 0);
        assert!(matches!(
            store.get_document(doc.id()).await,
            Err(VectorStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = InMemoryVectorStore::new(2, 0.15);
        let doc = document("a.txt");
        let chunks = chunks_for(&doc, &[&[1.0, 0.0]]);
        store.insert_document(&doc, &chunks).await.unwrap();

        let again = store.insert_document(&doc, &chunks).await;
        assert!(matches!(again, Err(VectorStoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_search_orders_and_filters() {
        let store = InMemoryVectorStore::new(2, 0.15);
        let a = document("a.txt");
        let b = document("b.txt");
        store
            .insert_document(&a, &chunks_for(&a, &[&[1.0, 0.0], &[0.0, 1.0]]))
            .await
            .unwrap();
        store
            .insert_document(&b, &chunks_for(&b, &[&[1.0, 0.0], &[-1.0, 0.0]]))
            .await
            .unwrap();

        let query = unit(&[1.0, 0.0]);
        let hits = store.search(&query, 10, None).await.unwrap();

        // The orthogonal and opposite chunks fall under the floor; the two
        // identical matches tie and are ordered by document id.
        assert_eq!(hits.len(), 2);
        let (first, second) = if a.id() < b.id() { (a.id(), b.id()) } else { (b.id(), a.id()) };
        assert_eq!(hits[0].document_id, first);
        assert_eq!(hits[1].document_id, second);

        let only_b = store.search(&query, 10, Some(&[b.id()])).await.unwrap();
        assert!(only_b.iter().all(|h| h.document_id == b.id()));
        assert_eq!(only_b.len(), 1);

        let repeated = store.search(&query, 10, None).await.unwrap();
        assert_eq!(hits, repeated);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_with_total() {
        let store = InMemoryVectorStore::new(2, 0.15);
        let mut ids = Vec::new();
        for name in ["one", "two", "three"] {
            let doc = document(name);
            store
                .insert_document(&doc, &chunks_for(&doc, &[&[1.0, 0.0]]))
                .await
                .unwrap();
            ids.push(doc.id());
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let (page, total) = store.list_documents(0, 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id(), ids[2]);
        assert_eq!(page[1].id(), ids[1]);
    }

    #[tokio::test]
    async fn test_rejects_broken_chunk_sets() {
        let store = InMemoryVectorStore::new(2, 0.15);
        let doc = document("a.txt");
        let wrong_dim = vec![Chunk::new(doc.id(), 0, "x".into(), 1, unit(&[1.0, 0.0, 0.0]))];

        let result = store.insert_document(&doc, &wrong_dim).await;
        assert!(matches!(result, Err(VectorStoreError::InvalidData(_))));
        assert!(store.get_document(doc.id()).await.is_err());
    }
}
