use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use crate::core::errors::RagError;

/// Provider for the Google Gemini REST API.
///
/// Completions go through `models/{model}:generateContent`, embeddings
/// through `models/{model}:batchEmbedContents` so a whole chunk batch is
/// one request.
#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
    temperature: f32,
    client: Client,
}

impl GeminiProvider {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        embedding_model: &str,
        temperature: f32,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            embedding_model: embedding_model.to_string(),
            temperature,
            client: Client::new(),
        }
    }

    fn endpoint(&self, model: &str, action: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}?key={}",
            self.base_url,
            model,
            action,
            urlencoding::encode(&self.api_key)
        )
    }

    fn extract_completion(payload: &Value) -> Result<String, RagError> {
        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| RagError::Llm("generateContent response had no candidate text".to_string()))
    }

    fn extract_embeddings(payload: &Value) -> Vec<Vec<f32>> {
        let mut embeddings = Vec::new();
        if let Some(data) = payload["embeddings"].as_array() {
            for item in data {
                if let Some(vals) = item["values"].as_array() {
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
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let url = self.endpoint(&self.model, "generateContent");

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": self.temperature },
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(RagError::llm)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::Llm(format!("Gemini error {}: {}", status, text)));
        }

        let payload: Value = res.json().await.map_err(RagError::llm)?;
        Self::extract_completion(&payload)
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let url = self.endpoint(&self.embedding_model, "batchEmbedContents");

        let requests: Vec<Value> = texts
            .iter()
            .map(|text| {
                json!({
                    "model": format!("models/{}", self.embedding_model),
                    "content": { "parts": [{ "text": text }] },
                })
            })
            .collect();
        let body = json!({ "requests": requests });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(RagError::llm)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::Llm(format!("Gemini error {}: {}", status, text)));
        }

        let payload: Value = res.json().await.map_err(RagError::llm)?;
        Ok(Self::extract_embeddings(&payload))
    }
}
