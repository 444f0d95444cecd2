//! Embedding providers.
//!
//! The local provider (an Ollama server) is always built. Hosted providers
//! sit behind the `gemini` and `openai` cargo features, and only the
//! provider selected at startup is registered.

mod ollama;
#[cfg(feature = "gemini")]
mod gemini;
#[cfg(feature = "openai")]
mod openai;

pub use ollama::OllamaEmbedder;
#[cfg(feature = "gemini")]
pub use gemini::GeminiEmbedder;
#[cfg(feature = "openai")]
pub use openai::OpenAiEmbedder;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{Args, EmbeddingProvider};
use crate::error::AppError;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn provider(&self) -> EmbeddingProvider;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;
}

/// Provider selection passed along with every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingOptions {
    pub provider: EmbeddingProvider,
    pub dimensions: usize,
}

impl Default for EmbeddingOptions {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Local,
            dimensions: 768,
        }
    }
}

#[derive(Default, Clone)]
pub struct EmbedderRegistry {
    embedders: HashMap<EmbeddingProvider, Arc<dyn Embedder>>,
}

impl EmbedderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, embedder: Arc<dyn Embedder>) {
        self.embedders.insert(embedder.provider(), embedder);
    }

    pub fn get(&self, provider: EmbeddingProvider) -> Result<Arc<dyn Embedder>, AppError> {
        self.embedders
            .get(&provider)
            .cloned()
            .ok_or_else(|| AppError::ProviderUnavailable(provider.to_string()))
    }
}

/// Build the embedder for the configured provider.
pub fn build_embedder(args: &Args, client: reqwest::Client) -> Result<Arc<dyn Embedder>, AppError> {
    let provider = args.embedding_provider;
    let model = args
        .embedding_model
        .clone()
        .unwrap_or_else(|| provider.default_model().to_string());

    match provider {
        EmbeddingProvider::Local => Ok(Arc::new(OllamaEmbedder::new(
            client,
            &args.ollama_url,
            model,
        ))),
        #[cfg(feature = "gemini")]
        EmbeddingProvider::Gemini => {
            let key = args
                .gemini_api_key
                .clone()
                .ok_or_else(|| {
                    AppError::ProviderUnavailable("gemini (GEMINI_API_KEY not set)".into())
                })?;
            Ok(Arc::new(GeminiEmbedder::new(
                client,
                key,
                model,
                args.embedding_dimensions,
            )))
        }
        #[cfg(feature = "openai")]
        EmbeddingProvider::Openai => {
            let key = args
                .openai_api_key
                .clone()
                .ok_or_else(|| {
                    AppError::ProviderUnavailable("openai (OPENAI_API_KEY not set)".into())
                })?;
            Ok(Arc::new(OpenAiEmbedder::new(
                client,
                key,
                model,
                args.embedding_dimensions,
            )))
        }
        #[allow(unreachable_patterns)]
        other => Err(AppError::ProviderUnavailable(format!(
            "{} (built without the '{}' feature)",
            other, other
        ))),
    }
}
