use diesel::prelude::*;
use diesel::sql_types::{Double, Integer, Text, Uuid as SqlUuid};
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::entities::{Chunk, SearchHit};
use crate::infrastructure::database::schema::ai_chunks;

#[derive(Debug, Insertable)]
#[diesel(table_name = ai_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewChunkModel {
    pub id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: i32,
    pub content: String,
    pub token_count: i32,
    pub embedding: Vector,
}

impl From<&Chunk> for NewChunkModel {
    fn from(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id(),
            document_id: chunk.document_id(),
            chunk_index: chunk.chunk_index(),
            content: chunk.content().to_string(),
            token_count: chunk.token_count(),
            embedding: Vector::from(chunk.embedding().as_slice().to_vec()),
        }
    }
}

/// One row of the nearest-neighbour query.
#[derive(Debug, QueryableByName)]
pub struct SearchRow {
    #[diesel(sql_type = SqlUuid)]
    pub chunk_id: Uuid,
    #[diesel(sql_type = SqlUuid)]
    pub document_id: Uuid,
    #[diesel(sql_type = Integer)]
    pub chunk_index: i32,
    #[diesel(sql_type = Text)]
    pub content: String,
    #[diesel(sql_type = Double)]
    pub score: f64,
}

impl From<SearchRow> for SearchHit {
    fn from(row: SearchRow) -> Self {
        SearchHit {
            chunk_id: row.chunk_id,
            document_id: row.document_id,
            chunk_index: row.chunk_index,
            content: row.content,
            score: row.score,
        }
    }
}

#[derive(Debug, QueryableByName)]
pub struct ColumnType {
    #[diesel(sql_type = Text)]
    pub type_name: String,
}
