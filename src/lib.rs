//! ragbot - conversational RAG assistant library
//!
//! Indexes local documents into a SQLite vector store and answers
//! questions grounded in them, with per-session conversation memory
//! and an optional tool-routing research agent.
//!
//! The library is organized into the following modules:
//!
//! - `rag`: chunking, ingestion, retrieval index, and the RAG engine
//! - `history`: in-memory per-session conversation store
//! - `llm`: provider trait plus Gemini and OpenAI-compatible backends
//! - `agent`: research agent that routes a question to one tool
//! - `search`: web search (Google Custom Search with DuckDuckGo fallback)
//! - `mcp`: remote documentation server client
//! - `core`: configuration and the shared error type
//! - `cli`: command-line interface definition

pub mod agent;
pub mod cli;
pub mod core;
pub mod history;
pub mod llm;
pub mod logging;
pub mod mcp;
pub mod rag;
pub mod search;

// Re-export commonly used types
pub use agent::{AgentAnswer, ResearchAgent, ToolRoute};
pub use core::{Config, RagError};
pub use history::ConversationStore;
pub use llm::{build_provider, LlmProvider};
pub use rag::{ingest_folder, split_text, RagAnswer, RagEngine, RetrievalIndex, SqliteIndex};
