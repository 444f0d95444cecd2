#![allow(dead_code)]

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;

use docs_site::build_router;
use docs_site::db::ContentStore;
use docs_site::embedding::EmbeddingOptions;
use docs_site::error::AppError;
use docs_site::models::{Article, SearchResult};
use docs_site::rate_limit::{InMemoryRateLimiter, RateLimitConfig};
use docs_site::search::{SearchBackend, SearchQuery};
use docs_site::state::AppState;

pub fn article(slug: &str, folder: Option<&str>, content: &str) -> Article {
    Article {
        id: 1,
        slug: slug.to_string(),
        title: format!("Title of {}", slug),
        content: content.to_string(),
        folder: folder.map(str::to_string),
        tags: vec!["docs".to_string()],
        created_at: "2026-01-01 00:00:00".to_string(),
        updated_at: "2026-02-03 04:05:06".to_string(),
    }
}

pub struct StubStore {
    pub articles: Vec<Article>,
}

#[async_trait]
impl ContentStore for StubStore {
    async fn all_articles(&self) -> Result<Vec<Article>, AppError> {
        Ok(self.articles.clone())
    }

    async fn article_by_slug(&self, slug: &str) -> Result<Option<Article>, AppError> {
        Ok(self.articles.iter().find(|a| a.slug == slug).cloned())
    }

    async fn articles_by_folder(&self, folder: &str) -> Result<Vec<Article>, AppError> {
        Ok(self
            .articles
            .iter()
            .filter(|a| a.folder.as_deref() == Some(folder))
            .cloned()
            .collect())
    }

    async fn folders(&self) -> Result<Vec<String>, AppError> {
        let mut folders: Vec<String> =
            self.articles.iter().filter_map(|a| a.folder.clone()).collect();
        folders.sort();
        folders.dedup();
        Ok(folders)
    }

    async fn nearest(
        &self,
        _embedding: &[f32],
        _limit: u32,
    ) -> Result<Vec<SearchResult>, AppError> {
        Ok(vec![])
    }
}

/// Returns a fixed number of hits and remembers the last query it saw.
pub struct StubSearch {
    pub hits: usize,
    pub fail: bool,
    pub last: std::sync::Mutex<Option<SearchQuery>>,
}

impl StubSearch {
    pub fn returning(hits: usize) -> Self {
        Self {
            hits,
            fail: false,
            last: std::sync::Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: 0,
            fail: true,
            last: std::sync::Mutex::new(None),
        }
    }

    pub fn last_query(&self) -> Option<SearchQuery> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for StubSearch {
    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchResult>, AppError> {
        *self.last.lock().unwrap() = Some(query);
        if self.fail {
            return Err(AppError::Database("connection refused".to_string()));
        }
        Ok((0..self.hits)
            .map(|i| SearchResult {
                id: i as i64,
                slug: format!("doc-{}", i),
                title: format!("Doc {}", i),
                content: String::new(),
                folder: None,
                tags: vec![],
                distance: i as f64 * 0.1,
                created_at: String::new(),
                updated_at: String::new(),
            })
            .collect())
    }
}

pub async fn spawn_app(store: StubStore, search: Arc<StubSearch>) -> String {
    let state = Arc::new(AppState {
        store: Arc::new(store),
        search,
        rate_limiter: Arc::new(InMemoryRateLimiter::new()),
        search_quota: RateLimitConfig::new(20, 60),
        embedding: EmbeddingOptions::default(),
        trust_proxy: false,
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    format!("http://{}", addr)
}
