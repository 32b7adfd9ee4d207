pub mod gemini;
pub mod openai_compat;
pub mod provider;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use provider::LlmProvider;

use std::sync::Arc;

use crate::core::config::Config;
use crate::core::errors::RagError;

/// Builds the provider selected by `config.provider`.
pub fn build_provider(config: &Config) -> Result<Arc<dyn LlmProvider>, RagError> {
    match config.provider.as_str() {
        "gemini" => {
            let api_key = config
                .gemini_api_key
                .as_deref()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    RagError::Config(
                        "GEMINI_API_KEY is not set; export it or put gemini_api_key in the config file".to_string(),
                    )
                })?;
            Ok(Arc::new(GeminiProvider::new(
                &config.gemini_base_url,
                api_key,
                &config.model,
                &config.embedding_model,
                config.temperature,
            )))
        }
        "openai-compat" | "openai" | "lmstudio" => Ok(Arc::new(OpenAiCompatProvider::new(
            &config.openai_base_url,
            &config.model,
            &config.embedding_model,
            config.temperature,
        ))),
        other => Err(RagError::Config(format!("unknown provider '{}'", other))),
    }
}
