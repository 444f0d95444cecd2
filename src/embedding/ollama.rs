use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::config::EmbeddingProvider;
use crate::error::AppError;

// Ollama embed API request format
#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

// Ollama embed API response format
#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Local provider: embeddings from an Ollama server.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: reqwest::Client, url: &str, model: String) -> Self {
        // add http:// if not present
        let url = if url.starts_with("http") {
            url.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", url.trim_end_matches('/'))
        };
        Self { client, url, model }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn provider(&self) -> EmbeddingProvider {
        EmbeddingProvider::Local
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let res = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&EmbedRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(AppError::Embedding(format!(
                "ollama returned {}",
                res.status()
            )));
        }

        let body: EmbedResponse = res.json().await?;
        body.embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("ollama returned no embeddings".to_string()))
    }
}
