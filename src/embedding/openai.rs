use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::config::EmbeddingProvider;
use crate::error::AppError;

const OPENAI_EMBEDDINGS: &str = "https://api.openai.com/v1/embeddings";

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(client: reqwest::Client, api_key: String, model: String, dimensions: usize) -> Self {
        Self {
            client,
            api_key,
            model,
            dimensions,
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn provider(&self) -> EmbeddingProvider {
        EmbeddingProvider::Openai
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let res = self
            .client
            .post(OPENAI_EMBEDDINGS)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: text,
                dimensions: self.dimensions,
            })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(AppError::Embedding(format!(
                "openai returned {}",
                res.status()
            )));
        }

        let body: EmbeddingsResponse = res.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::Embedding("openai returned no embeddings".to_string()))
    }
}
