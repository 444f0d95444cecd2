//! Article storage.
//!
//! Articles live in an `articles` table that an external indexer fills with
//! markdown and embeddings. The site only reads it, through [`ContentStore`]:
//! a hosted libSQL database over HTTP when credentials are configured, or a
//! local SQLite file otherwise.

mod local;
mod remote;

pub use local::LocalStore;
#[cfg(test)]
pub(crate) use local::NewArticle;
pub use remote::RemoteStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::DatabaseTarget;
use crate::error::AppError;
use crate::models::{Article, SearchResult};

pub(crate) const ARTICLE_COLUMNS: &str =
    "id, slug, title, content, folder, tags, created_at, updated_at";

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn all_articles(&self) -> Result<Vec<Article>, AppError>;

    async fn article_by_slug(&self, slug: &str) -> Result<Option<Article>, AppError>;

    async fn articles_by_folder(&self, folder: &str) -> Result<Vec<Article>, AppError>;

    async fn folders(&self) -> Result<Vec<String>, AppError>;

    /// Articles closest to `embedding` by cosine distance, nearest first.
    async fn nearest(&self, embedding: &[f32], limit: u32) -> Result<Vec<SearchResult>, AppError>;
}

/// Open the store described by `target`.
pub async fn connect(
    target: &DatabaseTarget,
    client: reqwest::Client,
) -> Result<Arc<dyn ContentStore>, AppError> {
    match target {
        DatabaseTarget::Remote { url, auth_token } => {
            tracing::info!(url = %url, "using remote libSQL database");
            Ok(Arc::new(RemoteStore::new(client, url, auth_token)))
        }
        DatabaseTarget::Local { path } => {
            tracing::info!(path = %path, "using local SQLite database");
            let store = LocalStore::open(path).await?;
            Ok(Arc::new(store))
        }
    }
}

// Tags are stored as a JSON array; anything else reads as no tags
pub(crate) fn parse_tags(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}
