//! Hugging Face Inference API provider.
//!
//! One client implements both external collaborators: the feature-extraction
//! pipeline supplies embeddings, and an OpenAI-compatible chat completion on
//! the HF router turns resolved facts into fluent sentences.

use async_trait::async_trait;
use reqwest::Client;
use ridewise_core::{ChatMessage, EmbeddingProvider, PhrasingProvider, ResolvedFact, Role};
use serde_json::json;
use tracing::info;

use crate::retry::{DEFAULT_BACKOFF, retry_with_backoff};

const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_ROUTER_URL: &str = "https://router.huggingface.co/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
const DEFAULT_PHRASING_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";

#[derive(Clone)]
pub struct HfProvider {
    client: Client,
    api_key: String,
    inference_url: String,
    router_url: String,
    embedding_model: String,
    phrasing_model: String,
}

impl HfProvider {
    /// Convert f64 to f32 for embedding values.
    /// Precision loss is acceptable for ML embeddings.
    #[expect(clippy::cast_possible_truncation, reason = "ML embeddings use f32")]
    const fn f64_to_f32(x: f64) -> f32 {
        x as f32
    }

    #[must_use]
    pub fn new(api_key: String) -> Self {
        info!("Creating HfProvider");
        Self {
            client: Client::new(),
            api_key,
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            router_url: DEFAULT_ROUTER_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            phrasing_model: DEFAULT_PHRASING_MODEL.to_string(),
        }
    }

    #[must_use]
    pub fn with_inference_url(mut self, url: String) -> Self {
        self.inference_url = url;
        self
    }

    #[must_use]
    pub fn with_router_url(mut self, url: String) -> Self {
        self.router_url = url;
        self
    }

    #[must_use]
    pub fn with_embedding_model(mut self, model: String) -> Self {
        self.embedding_model = model;
        self
    }

    #[must_use]
    pub fn with_phrasing_model(mut self, model: String) -> Self {
        self.phrasing_model = model;
        self
    }

    async fn try_embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let response = self
            .client
            .post(format!(
                "{}/pipeline/feature-extraction/{}",
                self.inference_url, self.embedding_model
            ))
            .bearer_auth(&self.api_key)
            .json(&json!({ "inputs": text }))
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        response
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: expected embedding array"))?
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(Self::f64_to_f32)
                    .ok_or_else(|| anyhow::anyhow!("Invalid embedding value"))
            })
            .collect()
    }

    async fn try_chat(&self, request: &serde_json::Value) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.router_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing content"))?
            .to_string();

        Ok(content)
    }

    /// One line per fact, the looked-up field first, for the phrasing prompt.
    fn fact_summary(fact: &ResolvedFact) -> String {
        let mut lines = vec![
            format!("station: {}", fact.station),
            format!("{}: {}", fact.field, fact.value),
        ];
        for (key, value) in &fact.context {
            if *key != fact.field {
                lines.push(format!("{key}: {value}"));
            }
        }
        lines.join("\n")
    }
}

#[async_trait]
impl EmbeddingProvider for HfProvider {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        info!("Embedding query with {}", self.embedding_model);
        retry_with_backoff(|| self.try_embed(text), DEFAULT_BACKOFF).await
    }
}

#[async_trait]
impl PhrasingProvider for HfProvider {
    async fn phrase(&self, query: &str, fact: &ResolvedFact) -> anyhow::Result<String> {
        let messages = vec![
            ChatMessage {
                role: Role::System,
                content: format!(
                    "You are a transit assistant. Answer the rider's question in one \
                     friendly sentence using only these facts:\n{}",
                    Self::fact_summary(fact)
                ),
            },
            ChatMessage {
                role: Role::User,
                content: query.to_string(),
            },
        ];

        let request = json!({
            "model": self.phrasing_model,
            "messages": messages,
        });

        info!("Phrasing answer with {}", self.phrasing_model);
        retry_with_backoff(|| self.try_chat(&request), DEFAULT_BACKOFF).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_summary_skips_duplicate_field() {
        let fact = ResolvedFact {
            station: "MacArthur".to_string(),
            field: "parking_cost".to_string(),
            value: "$5 per day".to_string(),
            context: vec![
                ("parking_cost".to_string(), "$5 per day".to_string()),
                ("has_parking".to_string(), "yes".to_string()),
            ],
        };

        let summary = HfProvider::fact_summary(&fact);
        assert_eq!(
            summary,
            "station: MacArthur\nparking_cost: $5 per day\nhas_parking: yes"
        );
    }
}
