use axum::Json;
use axum::body::to_bytes;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::{
    RATE_LIMIT_KEYS, SEARCH_FAILURES, SEARCH_LATENCY, SEARCH_RATE_LIMITED, SEARCH_REQUESTS,
};
use crate::models::{ErrorBody, InvalidSearch, RateLimitedBody, SearchParams, SearchResponse};
use crate::rate_limit::{client_key, rate_limit_headers};
use crate::search::SearchQuery;
use crate::state::AppState;

// Same cap the site applies to any submitted body
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub async fn search_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    SEARCH_REQUESTS.inc();

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer, state.trust_proxy);
    let limit = state.rate_limiter.check(&key, &state.search_quota).await;
    RATE_LIMIT_KEYS.set(state.rate_limiter.tracked_keys() as f64);
    let quota_headers = rate_limit_headers(&limit);

    if !limit.allowed {
        SEARCH_RATE_LIMITED.inc();
        // one clock sample for both body and header
        let retry_after = limit.retry_after_secs(Utc::now());
        tracing::warn!(client = %key, retry_after, "search rate limit exceeded");

        let mut headers = quota_headers;
        headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        return (
            StatusCode::TOO_MANY_REQUESTS,
            headers,
            Json(RateLimitedBody {
                error: "Too many requests".to_string(),
                message: "Rate limit exceeded. Please try again later.".to_string(),
                retry_after,
            }),
        )
            .into_response();
    }

    let body = match to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            let invalid = InvalidSearch::MalformedBody(e.to_string());
            return (StatusCode::BAD_REQUEST, quota_headers, Json(invalid.into_body()))
                .into_response();
        }
    };

    let params = match SearchParams::from_body(&body) {
        Ok(params) => params,
        Err(invalid) => {
            tracing::debug!(client = %key, reason = ?invalid, "rejected search request");
            return (StatusCode::BAD_REQUEST, quota_headers, Json(invalid.into_body()))
                .into_response();
        }
    };

    let start_time = Instant::now();
    let query = SearchQuery {
        query: params.query.clone(),
        limit: params.limit,
        embedding: state.embedding,
    };

    match state.search.search(query).await {
        Ok(results) => {
            SEARCH_LATENCY.observe(start_time.elapsed().as_secs_f64());
            tracing::info!(
                client = %key,
                limit = params.limit,
                count = results.len(),
                "search completed"
            );
            (
                StatusCode::OK,
                quota_headers,
                Json(SearchResponse {
                    count: results.len(),
                    results,
                    query: params.query,
                }),
            )
                .into_response()
        }
        Err(e) => {
            SEARCH_FAILURES.inc();
            tracing::error!(error = %e, client = %key, "search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                quota_headers,
                Json(ErrorBody {
                    error: "Search failed".to_string(),
                    message: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

// anything but POST
pub async fn search_method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody {
            error: "Use POST method for search".to_string(),
            message: None,
        }),
    )
        .into_response()
}
