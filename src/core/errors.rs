use thiserror::Error;

/// Error type shared across the assistant's modules.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to read {path}: {reason}")]
    DocumentRead { path: String, reason: String },

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("retrieval index error: {0}")]
    Index(String),

    #[error("tool call failed: {0}")]
    Tool(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RagError {
    pub fn config<E: std::fmt::Display>(err: E) -> Self {
        RagError::Config(err.to_string())
    }

    pub fn document_read(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        RagError::DocumentRead {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    pub fn llm<E: std::fmt::Display>(err: E) -> Self {
        RagError::Llm(err.to_string())
    }

    pub fn index<E: std::fmt::Display>(err: E) -> Self {
        RagError::Index(err.to_string())
    }

    pub fn tool<E: std::fmt::Display>(err: E) -> Self {
        RagError::Tool(err.to_string())
    }

    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        RagError::Internal(err.to_string())
    }
}
