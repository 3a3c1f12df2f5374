use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::NormalizedVector;

/// A retrievable slice of a document's text together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    id: Uuid,
    document_id: Uuid,
    chunk_index: i32,
    content: String,
    token_count: i32,
    embedding: NormalizedVector,
}

impl Chunk {
    pub fn new(
        document_id: Uuid,
        chunk_index: i32,
        content: String,
        token_count: i32,
        embedding: NormalizedVector,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            chunk_index,
            content,
            token_count,
            embedding,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    pub fn chunk_index(&self) -> i32 {
        self.chunk_index
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn token_count(&self) -> i32 {
        self.token_count
    }

    pub fn embedding(&self) -> &NormalizedVector {
        &self.embedding
    }

    pub fn belongs_to(&self, document_id: Uuid) -> bool {
        self.document_id == document_id
    }
}

/// Checks the per-document chunk invariants: every chunk points at
/// `document_id`, indexes form `[0, N)` in order, and all embeddings share
/// dimension `dimension`.
pub fn validate_chunk_set(
    document_id: Uuid,
    chunks: &[Chunk],
    dimension: usize,
) -> Result<(), String> {
    for (position, chunk) in chunks.iter().enumerate() {
        if !chunk.belongs_to(document_id) {
            return Err(format!(
                "Chunk {} references document {} instead of {}",
                chunk.id(),
                chunk.document_id(),
                document_id
            ));
        }
        if chunk.chunk_index() as usize != position {
            return Err(format!(
                "Chunk index {} found at position {}; indexes must be contiguous from 0",
                chunk.chunk_index(),
                position
            ));
        }
        if chunk.embedding().dimension() != dimension {
            return Err(format!(
                "Chunk {} has embedding dimension {}, expected {}",
                chunk.chunk_index(),
                chunk.embedding().dimension(),
                dimension
            ));
        }
    }
    Ok(())
}
