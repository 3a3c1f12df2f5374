use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Array, BigInt, Double, Nullable, Uuid as SqlUuid};
use pgvector::Vector;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::chunk::validate_chunk_set;
use crate::domain::entities::{Chunk, Document, SearchHit};
use crate::domain::repositories::{VectorStore, VectorStoreError};
use crate::domain::value_objects::NormalizedVector;
use crate::infrastructure::database::models::{DocumentModel, NewChunkModel, SearchRow};
use crate::infrastructure::database::schema::{ai_chunks, ai_documents};
use crate::infrastructure::database::{DbPool, embedding_column_dimension, get_connection_from_pool};

/// Rows per INSERT statement; keeps bind parameters under the protocol limit.
const INSERT_BATCH: usize = 1000;
const INDEX_NAME: &str = "ai_chunks_embedding_idx";

// The inner query walks the ANN index; the outer one imposes the total order
// and the floor. Fetching 2k candidates leaves room for ties and the floor.
const SEARCH_SQL: &str = "\
SELECT chunk_id, document_id, chunk_index, content, score FROM (
    SELECT id AS chunk_id, document_id, chunk_index, content,
           1 - (embedding <=> $1) AS score
    FROM ai_chunks
    WHERE $2::uuid[] IS NULL OR document_id = ANY($2)
    ORDER BY embedding <=> $1, document_id, chunk_index
    LIMIT $3
) AS candidates
WHERE score >= $4
ORDER BY score DESC, document_id ASC, chunk_index ASC
LIMIT $5";

#[derive(Debug, Clone, Copy)]
pub struct PostgresVectorStoreConfig {
    pub dimension: usize,
    pub similarity_floor: f64,
    pub ivfflat_lists: u32,
    pub ivfflat_probes: u32,
}

pub struct PostgresVectorStore {
    pool: DbPool,
    config: PostgresVectorStoreConfig,
    /// Writers hold the read side; an index rebuild holds the write side.
    index_lock: Arc<RwLock<()>>,
}

impl PostgresVectorStore {
    pub fn new(pool: DbPool, config: PostgresVectorStoreConfig) -> Self {
        Self {
            pool,
            config,
            index_lock: Arc::new(RwLock::new(())),
        }
    }

    /// Runs a blocking diesel operation on the blocking pool.
    async fn with_connection<T, F>(&self, op: F) -> Result<T, VectorStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, VectorStoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_connection_from_pool(&pool)
                .map_err(|e| VectorStoreError::Unavailable(e.to_string()))?;
            op(&mut conn)
        })
        .await
        .map_err(|e| VectorStoreError::Unavailable(format!("database task failed: {}", e)))?
    }
}

fn classify(error: DieselError) -> VectorStoreError {
    match &error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            VectorStoreError::Conflict(error.to_string())
        }
        DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation
            | DatabaseErrorKind::CheckViolation
            | DatabaseErrorKind::NotNullViolation,
            _,
        ) => VectorStoreError::InvalidData(error.to_string()),
        DieselError::DeserializationError(_) => VectorStoreError::Corrupt(error.to_string()),
        _ => {
            tracing::error!("Vector store query failed: {}", error);
            VectorStoreError::Unavailable(error.to_string())
        }
    }
}

fn to_domain(model: DocumentModel) -> Result<Document, VectorStoreError> {
    Document::try_from(model).map_err(VectorStoreError::Corrupt)
}

#[async_trait]
impl VectorStore for PostgresVectorStore {
    async fn insert_document(
        &self,
        document: &Document,
        chunks: &[Chunk],
    ) -> Result<(), VectorStoreError> {
        validate_chunk_set(document.id(), chunks, self.config.dimension)
            .map_err(VectorStoreError::InvalidData)?;

        let document_row = DocumentModel::from(document);
        let chunk_rows: Vec<NewChunkModel> = chunks.iter().map(NewChunkModel::from).collect();

        let _writer = self.index_lock.read().await;
        self.with_connection(move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                diesel::insert_into(ai_documents::table)
                    .values(&document_row)
                    .execute(conn)?;
                for batch in chunk_rows.chunks(INSERT_BATCH) {
                    diesel::insert_into(ai_chunks::table)
                        .values(batch)
                        .execute(conn)?;
                }
                Ok(())
            })
            .map_err(classify)
        })
        .await
    }

    async fn delete_document(&self, document_id: Uuid) -> Result<bool, VectorStoreError> {
        let _writer = self.index_lock.read().await;
        self.with_connection(move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                diesel::delete(ai_chunks::table.filter(ai_chunks::document_id.eq(document_id)))
                    .execute(conn)?;
                let deleted = diesel::delete(ai_documents::table.find(document_id)).execute(conn)?;
                Ok(deleted > 0)
            })
            .map_err(classify)
        })
        .await
    }

    async fn get_document(&self, document_id: Uuid) -> Result<Document, VectorStoreError> {
        let model = self
            .with_connection(move |conn| {
                ai_documents::table
                    .find(document_id)
                    .select(DocumentModel::as_select())
                    .first(conn)
                    .optional()
                    .map_err(classify)
            })
            .await?;

        match model {
            Some(model) => to_domain(model),
            None => Err(VectorStoreError::NotFound(document_id)),
        }
    }

    async fn chunk_count(&self, document_id: Uuid) -> Result<i64, VectorStoreError> {
        self.with_connection(move |conn| {
            ai_chunks::table
                .filter(ai_chunks::document_id.eq(document_id))
                .count()
                .get_result::<i64>(conn)
                .map_err(classify)
        })
        .await
    }

    async fn list_documents(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Document>, i64), VectorStoreError> {
        let (models, total) = self
            .with_connection(move |conn| {
                conn.build_transaction()
                    .read_only()
                    .repeatable_read()
                    .run::<_, DieselError, _>(|conn| {
                        let total = ai_documents::table.count().get_result::<i64>(conn)?;
                        let models = ai_documents::table
                            .select(DocumentModel::as_select())
                            .order((ai_documents::created_at.desc(), ai_documents::id.asc()))
                            .offset(offset)
                            .limit(limit)
                            .load(conn)?;
                        Ok((models, total))
                    })
                    .map_err(classify)
            })
            .await?;

        let documents = models
            .into_iter()
            .map(to_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((documents, total))
    }

    async fn search(
        &self,
        query: &NormalizedVector,
        k: usize,
        document_ids: Option<&[Uuid]>,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        if query.dimension() != self.config.dimension {
            return Err(VectorStoreError::DimMismatch {
                expected: self.config.dimension,
                actual: query.dimension(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = Vector::from(query.as_slice().to_vec());
        let scope: Option<Vec<Uuid>> = document_ids.map(|ids| ids.to_vec());
        let limit = k as i64;
        let config = self.config;

        let rows = self
            .with_connection(move |conn| {
                conn.transaction::<_, DieselError, _>(|conn| {
                    diesel::sql_query(format!(
                        "SET LOCAL ivfflat.probes = {}",
                        config.ivfflat_probes.max(1)
                    ))
                    .execute(conn)?;

                    diesel::sql_query(SEARCH_SQL)
                        .bind::<pgvector::sql_types::Vector, _>(&vector)
                        .bind::<Nullable<Array<SqlUuid>>, _>(&scope)
                        .bind::<BigInt, _>(limit * 2)
                        .bind::<Double, _>(config.similarity_floor)
                        .bind::<BigInt, _>(limit)
                        .load::<SearchRow>(conn)
                })
                .map_err(classify)
            })
            .await?;

        Ok(rows.into_iter().map(SearchHit::from).collect())
    }

    async fn rebuild_index(&self) -> Result<u32, VectorStoreError> {
        let lists = self.config.ivfflat_lists.max(1);

        let _rebuild = self.index_lock.write().await;
        tracing::info!("Rebuilding {} with {} lists", INDEX_NAME, lists);

        self.with_connection(move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                diesel::sql_query(format!("DROP INDEX IF EXISTS {}", INDEX_NAME)).execute(conn)?;
                diesel::sql_query(format!(
                    "CREATE INDEX {} ON ai_chunks USING ivfflat (embedding vector_cosine_ops) \
                     WITH (lists = {})",
                    INDEX_NAME, lists
                ))
                .execute(conn)?;
                Ok(())
            })
            .map_err(classify)
        })
        .await?;

        Ok(lists)
    }

    async fn verify_schema(&self, dimension: usize) -> Result<(), VectorStoreError> {
        let declared = self
            .with_connection(|conn| embedding_column_dimension(conn).map_err(classify))
            .await?;

        match declared {
            None => Err(VectorStoreError::MigrationRequired(
                "ai_chunks.embedding is missing or is not a vector column".to_string(),
            )),
            Some(actual) if actual != dimension => Err(VectorStoreError::DimMismatch {
                expected: dimension,
                actual,
            }),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_cutoff_breaks_ties() {
        let (candidates, outer) = SEARCH_SQL.split_once(") AS candidates").unwrap();

        assert!(candidates.contains("ORDER BY embedding <=> $1, document_id, chunk_index"));
        assert!(outer.contains("ORDER BY score DESC, document_id ASC, chunk_index ASC"));
    }
}
