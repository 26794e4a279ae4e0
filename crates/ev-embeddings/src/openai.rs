//! Remote embeddings through an OpenAI-compatible `/embeddings` endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Embedder, EmbeddingError, check_count};

/// Client for `POST {api_base}/embeddings`.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Build a client for `api_base` (e.g. `https://api.openai.com/v1`).
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::InitFailed`] if the HTTP client cannot be built.
    pub fn new(
        api_base: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, EmbeddingError> {
        let http = reqwest::Client::builder()
            .user_agent("evidentia/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: format!("{}/embeddings", api_base.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> String {
        format!("openai/{}", self.model)
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: &texts,
            })
            .send()
            .await?;

        if resp.status() == 429 {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(EmbeddingError::RateLimited { retry_after_secs });
        }
        if !resp.status().is_success() {
            return Err(EmbeddingError::Api {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let mut body: EmbeddingResponse = resp.json().await?;
        body.data.sort_by_key(|d| d.index);
        check_count(texts.len(), body.data.len())?;
        tracing::debug!(model = %self.model, count = texts.len(), "remote embeddings received");
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}
