use async_trait::async_trait;

use crate::core::errors::RagError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "gemini", "openai-compat")
    fn name(&self) -> &str;

    /// single-prompt completion (non-streaming)
    async fn complete(&self, prompt: &str) -> Result<String, RagError>;

    /// generate embeddings, one vector per input text, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;
}
