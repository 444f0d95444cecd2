use std::sync::Arc;

use crate::db::ContentStore;
use crate::embedding::EmbeddingOptions;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::search::SearchBackend;

// app's shared state
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub search: Arc<dyn SearchBackend>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub search_quota: RateLimitConfig, // per-client quota on the search endpoint
    pub embedding: EmbeddingOptions,   // provider selection passed to every search
    pub trust_proxy: bool,
}
