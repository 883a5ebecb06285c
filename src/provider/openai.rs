//! Live embedding provider backed by the OpenAI embeddings endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;

use super::error::{ProviderError, ProviderResult};
use super::{EmbeddingProvider, EmbeddingVector};

const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Embedding provider speaking the OpenAI `/v1/embeddings` wire format.
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: EmbeddingVector,
}

impl OpenAiEmbeddingProvider {
    /// Builds a provider from config; fails hard when no API key is set.
    pub fn from_config(config: &Config) -> ProviderResult<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or(ProviderError::MissingApiKey { provider: "openai" })?;

        Ok(Self::new(api_key, config.embedding_model.clone()))
    }

    /// Builds a provider from explicit parts.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    /// Returns the model name requests are issued with.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OpenAiEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddingProvider")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> ProviderResult<Vec<EmbeddingVector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = texts.len(), model = %self.model, "requesting embeddings");

        let response = self
            .client
            .post(EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: EmbeddingsResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse {
                reason: e.to_string(),
            }
        })?;

        if body.data.len() != texts.len() {
            return Err(ProviderError::MalformedResponse {
                reason: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    body.data.len()
                ),
            });
        }

        // The API documents response order, but index is authoritative.
        let mut rows = body.data;
        rows.sort_by_key(|row| row.index);

        Ok(rows.into_iter().map(|row| row.embedding).collect())
    }
}
