//! Chunk records and the storage-backend trait for retrieval.
//!
//! The primary implementation is `SqliteIndex` in the `sqlite` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

/// A chunk of a source document as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Stable identifier, `{source_file}_chunk_{chunk_index}`.
    pub chunk_id: String,
    /// The text content of the chunk.
    pub text: String,
    /// File name the chunk came from (no directory part).
    pub source_file: String,
    /// Zero-based position of the chunk within its file.
    pub chunk_index: usize,
}

impl ChunkRecord {
    pub fn new(
        source_file: impl Into<String>,
        chunk_index: usize,
        text: impl Into<String>,
    ) -> Self {
        let source_file = source_file.into();
        ChunkRecord {
            chunk_id: format!("{}_chunk_{}", source_file, chunk_index),
            text: text.into(),
            source_file,
            chunk_index,
        }
    }

    /// Human-readable citation, e.g. `geo.txt (chunk 0)`.
    pub fn citation(&self) -> String {
        format!("{} (chunk {})", self.source_file, self.chunk_index)
    }
}

/// Result of a similarity search.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub record: ChunkRecord,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

/// Abstract trait for chunk index backends.
///
/// Implementations embed text themselves, so callers hand over plain text
/// on both the write and the read path.
#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    /// Insert chunks, replacing any existing chunk with the same id.
    async fn upsert(&self, records: &[ChunkRecord]) -> Result<(), RagError>;

    /// Return up to `top_k` chunks most similar to `query_text`, best first.
    async fn query(&self, query_text: &str, top_k: usize) -> Result<Vec<ScoredChunk>, RagError>;

    /// Total number of chunks stored.
    async fn count(&self) -> Result<u64, RagError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_ids_follow_the_file_and_index() {
        let record = ChunkRecord::new("geo.txt", 2, "Paris is the capital of France.");
        assert_eq!(record.chunk_id, "geo.txt_chunk_2");
        assert_eq!(record.source_file, "geo.txt");
        assert_eq!(record.chunk_index, 2);
    }

    #[test]
    fn citations_name_the_file_and_chunk() {
        let record = ChunkRecord::new("b.pdf", 2, "text");
        assert_eq!(record.citation(), "b.pdf (chunk 2)");
    }
}
