use axum::Json;
use axum::extract::{Path, State};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::Article;
use crate::state::AppState;

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Article>>, ApiError> {
    Ok(Json(state.store.all_articles().await?))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Article>, ApiError> {
    let slug = slug.trim_matches('/');
    state
        .store
        .article_by_slug(slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Article '{}' not found", slug)))
}

pub async fn list_folders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.store.folders().await?))
}

pub async fn folder_articles(
    State(state): State<Arc<AppState>>,
    Path(folder): Path<String>,
) -> Result<Json<Vec<Article>>, ApiError> {
    Ok(Json(state.store.articles_by_folder(&folder).await?))
}
