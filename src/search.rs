//! Semantic search over the article store.
//!
//! Ranking happens in the database; this module only turns the query into a
//! vector with the selected provider and asks the store for its neighbours.

use async_trait::async_trait;
use std::sync::Arc;

use crate::db::ContentStore;
use crate::embedding::{EmbedderRegistry, EmbeddingOptions};
use crate::error::AppError;
use crate::models::SearchResult;

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub limit: u32,
    pub embedding: EmbeddingOptions,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchResult>, AppError>;
}

pub struct VectorSearch {
    store: Arc<dyn ContentStore>,
    embedders: EmbedderRegistry,
}

impl VectorSearch {
    pub fn new(store: Arc<dyn ContentStore>, embedders: EmbedderRegistry) -> Self {
        Self { store, embedders }
    }
}

#[async_trait]
impl SearchBackend for VectorSearch {
    #[tracing::instrument(
        skip(self, query),
        fields(provider = %query.embedding.provider, limit = query.limit)
    )]
    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchResult>, AppError> {
        let embedder = self.embedders.get(query.embedding.provider)?;
        let vector = embedder.embed(&query.query).await?;

        if vector.len() != query.embedding.dimensions {
            return Err(AppError::Embedding(format!(
                "expected {} dimensions, provider returned {}",
                query.embedding.dimensions,
                vector.len()
            )));
        }

        self.store.nearest(&vector, query.limit).await
    }
}
