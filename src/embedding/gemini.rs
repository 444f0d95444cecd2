use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::config::EmbeddingProvider;
use crate::error::AppError;

const GEMINI_API: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    content: Content<'a>,
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl GeminiEmbedder {
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
impl Embedder for GeminiEmbedder {
    fn provider(&self) -> EmbeddingProvider {
        EmbeddingProvider::Gemini
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let res = self
            .client
            .post(format!("{}/models/{}:embedContent", GEMINI_API, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&EmbedContentRequest {
                content: Content {
                    parts: [Part { text }],
                },
                output_dimensionality: self.dimensions,
            })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(AppError::Embedding(format!(
                "gemini returned {}",
                res.status()
            )));
        }

        let body: EmbedContentResponse = res.json().await?;
        Ok(body.embedding.values)
    }
}
