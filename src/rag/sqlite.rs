//! SQLite-backed retrieval index implementation.
//!
//! In-process vector store using SQLite for storage and brute-force cosine
//! similarity for search. Text is embedded at the index boundary by the
//! configured `LlmProvider`, so callers never handle raw vectors.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkRecord, RetrievalIndex, ScoredChunk};
use crate::core::errors::RagError;
use crate::llm::provider::LlmProvider;

pub struct SqliteIndex {
    pool: SqlitePool,
    embedder: Arc<dyn LlmProvider>,
}

impl SqliteIndex {
    pub async fn with_path(
        db_path: PathBuf,
        embedder: Arc<dyn LlmProvider>,
    ) -> Result<Self, RagError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(RagError::index)?;

        let index = Self { pool, embedder };
        index.init_schema().await?;
        Ok(index)
    }

    async fn init_schema(&self) -> Result<(), RagError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source_file TEXT NOT NULL DEFAULT '',
                chunk_index INTEGER NOT NULL DEFAULT 0,
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(RagError::index)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_file)")
            .execute(&self.pool)
            .await
            .map_err(RagError::index)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> ChunkRecord {
        let chunk_index: i64 = row.get("chunk_index");
        ChunkRecord {
            chunk_id: row.get("chunk_id"),
            text: row.get("content"),
            source_file: row.get("source_file"),
            chunk_index: chunk_index as usize,
        }
    }
}

#[async_trait]
impl RetrievalIndex for SqliteIndex {
    async fn upsert(&self, records: &[ChunkRecord]) -> Result<(), RagError> {
        if records.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != records.len() {
            return Err(RagError::Index(format!(
                "embedder returned {} vectors for {} texts",
                embeddings.len(),
                records.len()
            )));
        }

        let mut tx = self.pool.begin().await.map_err(RagError::index)?;

        for (record, embedding) in records.iter().zip(embeddings.iter()) {
            let blob = Self::serialize_embedding(embedding);

            sqlx::query(
                "INSERT OR REPLACE INTO chunks (chunk_id, content, source_file, chunk_index, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&record.chunk_id)
            .bind(&record.text)
            .bind(&record.source_file)
            .bind(record.chunk_index as i64)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(RagError::index)?;
        }

        tx.commit().await.map_err(RagError::index)?;
        Ok(())
    }

    async fn query(&self, query_text: &str, top_k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        let embedded = self.embedder.embed(&[query_text.to_string()]).await?;
        let query_embedding = embedded
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Index("embedder returned no vector for query".to_string()))?;

        let rows = sqlx::query(
            "SELECT chunk_id, content, source_file, chunk_index, embedding FROM chunks",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RagError::index)?;

        let mut scored: Vec<ScoredChunk> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(&query_embedding, &stored);

                Some(ScoredChunk {
                    record: Self::row_to_record(row),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        Ok(scored)
    }

    async fn count(&self) -> Result<u64, RagError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(RagError::index)?;

        Ok(count as u64)
    }
}
