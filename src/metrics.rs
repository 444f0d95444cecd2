use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};

lazy_static! {
    pub static ref SEARCH_REQUESTS: Counter =
        register_counter!("docs_search_requests_total", "Total number of search requests").unwrap();
    pub static ref SEARCH_RATE_LIMITED: Counter =
        register_counter!(
            "docs_search_rate_limited_total",
            "Search requests rejected by the rate limiter"
        )
        .unwrap();
    pub static ref SEARCH_FAILURES: Counter =
        register_counter!(
            "docs_search_failures_total",
            "Searches that failed in the search backend"
        )
        .unwrap();
    pub static ref SEARCH_LATENCY: Histogram = register_histogram!(
        "docs_search_latency_seconds",
        "Search backend latency in seconds"
    )
    .unwrap();
    pub static ref RATE_LIMIT_KEYS: Gauge =
        register_gauge!(
            "docs_rate_limit_keys",
            "Client keys currently tracked by the rate limiter"
        )
        .unwrap();
    pub static ref PAGE_VIEWS: Counter =
        register_counter!("docs_page_views_total", "Rendered documentation pages").unwrap();
}
