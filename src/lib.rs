//! Documentation site backed by a libSQL article store.
//!
//! Serves markdown articles as HTML pages with folder navigation and a table
//! of contents, plus a rate limited semantic search endpoint.

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod markdown;
pub mod metrics;
pub mod models;
pub mod nav;
pub mod pages;
pub mod rate_limit;
pub mod search;
pub mod state;

use axum::Router;
use axum::routing::{MethodRouter, get, post};
use std::sync::Arc;

use crate::handlers::{
    article_handler, folder_articles, get_article, health_handler, home_handler, list_articles,
    list_folders, metrics_handler, not_found_handler, search_handler, search_method_not_allowed,
};
use crate::state::AppState;

fn search_route() -> MethodRouter<Arc<AppState>> {
    post(search_handler).fallback(search_method_not_allowed)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/content/{*slug}", get(article_handler))
        .route("/search", search_route())
        .route("/api/search", search_route())
        .route("/api/articles", get(list_articles))
        .route("/api/articles/{*slug}", get(get_article))
        .route("/api/folders", get(list_folders))
        .route("/api/folders/{folder}", get(folder_articles))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .fallback(not_found_handler)
        .with_state(state)
}
