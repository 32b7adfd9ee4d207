//! Retrieval-augmented generation pipeline.
//!
//! This module provides:
//! - `split_text`: the sentence-packing chunker
//! - `ingest_folder`: folder ingestion into a `RetrievalIndex`
//! - `RagEngine`: the conversational answer flow with citations
//! - `SqliteIndex`: the SQLite-backed index implementation

pub mod chunker;
pub mod engine;
pub mod ingest;
pub mod reader;
pub mod sqlite;
pub mod store;

pub use chunker::split_text;
pub use engine::{Contextualized, RagAnswer, RagEngine};
pub use ingest::{ingest_folder, IngestReport};
pub use sqlite::SqliteIndex;
pub use store::{ChunkRecord, RetrievalIndex, ScoredChunk};
