use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use crate::core::errors::RagError;

/// Provider for OpenAI-compatible servers (LM Studio, llama.cpp and
/// similar local endpoints).
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    base_url: String,
    model: String,
    embedding_model: String,
    temperature: f32,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(base_url: &str, model: &str, embedding_model: &str, temperature: f32) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            embedding_model: embedding_model.to_string(),
            temperature,
            client: Client::new(),
        }
    }

    fn extract_completion(payload: &Value) -> Result<String, RagError> {
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| RagError::Llm("chat response had no message content".to_string()))
    }

    fn extract_embeddings(payload: &Value) -> Vec<Vec<f32>> {
        let mut embeddings = Vec::new();
        if let Some(data) = payload["data"].as_array() {
            for item in data {
                if let Some(vals) = item["embedding"].as_array() {
                    let vec: Vec<f32> = vals
                        .iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect();
                    embeddings.push(vec);
                }
            }
        }
        embeddings
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
            "temperature": self.temperature,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(RagError::llm)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::Llm(format!("chat endpoint error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(RagError::llm)?;
        Self::extract_completion(&payload)
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": self.embedding_model,
            "input": texts,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(RagError::llm)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::Llm(format!("embeddings endpoint error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(RagError::llm)?;
        Ok(Self::extract_embeddings(&payload))
    }
}
