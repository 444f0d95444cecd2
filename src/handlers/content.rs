use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use std::sync::Arc;

use crate::error::ApiError;
use crate::markdown::render_markdown;
use crate::metrics::PAGE_VIEWS;
use crate::nav::build_sections;
use crate::pages::{article_page, home_page, not_found_page};
use crate::state::AppState;

pub async fn home_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let articles = state.store.all_articles().await?;
    PAGE_VIEWS.inc();
    Ok(Html(home_page(&build_sections(&articles))))
}

// GET /content/{*slug} - slug may span several path segments
pub async fn article_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let slug = slug.trim_matches('/').to_string();
    let current_path = format!("/content/{}", slug);

    let article = state.store.article_by_slug(&slug).await?;
    let articles = state.store.all_articles().await?;
    let sections = build_sections(&articles);

    let Some(article) = article else {
        tracing::debug!(slug = %slug, "article not found");
        return Ok((
            StatusCode::NOT_FOUND,
            Html(not_found_page(&sections, &current_path)),
        )
            .into_response());
    };

    let rendered = render_markdown(&article.content);
    PAGE_VIEWS.inc();
    Ok(Html(article_page(&article, &rendered, &sections, &current_path)).into_response())
}

// Any path no route matched
pub async fn not_found_handler(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let articles = match state.store.all_articles().await {
        Ok(articles) => articles,
        Err(e) => {
            tracing::warn!(error = %e, "rendering 404 page without navigation");
            Vec::new()
        }
    };
    let sections = build_sections(&articles);
    (
        StatusCode::NOT_FOUND,
        Html(not_found_page(&sections, uri.path())),
    )
        .into_response()
}
