mod common;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;

use common::{StubSearch, StubStore, spawn_app};

async fn spawn(search: Arc<StubSearch>) -> String {
    spawn_app(StubStore { articles: vec![] }, search).await
}

async fn post(base_url: &str, body: Value) -> reqwest::Response {
    Client::new()
        .post(format!("{}/search", base_url))
        .json(&body)
        .send()
        .await
        .expect("Failed to send search")
}

#[tokio::test]
async fn search_returns_results_count_and_query() {
    let search = Arc::new(StubSearch::returning(3));
    let base_url = spawn(Arc::clone(&search)).await;

    let res = post(&base_url, json!({"query": "hello", "limit": 5})).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-ratelimit-remaining"], "19");
    assert!(res.headers().contains_key("x-ratelimit-reset"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["count"], 3);
    assert_eq!(body["query"], "hello");
    assert_eq!(body["results"].as_array().unwrap().len(), 3);
    assert_eq!(body["results"][0]["slug"], "doc-0");

    let seen = search.last_query().unwrap();
    assert_eq!(seen.limit, 5);
    assert_eq!(seen.query, "hello");
}

#[tokio::test]
async fn limit_is_clamped_before_search() {
    let search = Arc::new(StubSearch::returning(0));
    let base_url = spawn(Arc::clone(&search)).await;

    for (limit, expected) in [(json!(0), 1), (json!(1000), 20), (Value::Null, 10)] {
        let body = if limit.is_null() {
            json!({"query": "x"})
        } else {
            json!({"query": "x", "limit": limit})
        };
        let res = post(&base_url, body).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(search.last_query().unwrap().limit, expected);
    }
}

#[tokio::test]
async fn invalid_queries_are_bad_requests_with_quota_headers() {
    let search = Arc::new(StubSearch::returning(1));
    let base_url = spawn(Arc::clone(&search)).await;

    let long = "a".repeat(501);
    for body in [
        json!({}),
        json!({"query": ""}),
        json!({"query": 12}),
        json!({"query": long}),
    ] {
        let res = post(&base_url, body).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(res.headers().contains_key("x-ratelimit-remaining"));
        let body: Value = res.json().await.unwrap();
        assert!(body["error"].is_string());
    }
    assert!(search.last_query().is_none());

    let res = post(&base_url, json!({"query": "a".repeat(500)})).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn too_long_query_explains_itself() {
    let base_url = spawn(Arc::new(StubSearch::returning(0))).await;
    let res = post(&base_url, json!({"query": "q".repeat(501)})).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Query too long");
    assert_eq!(body["message"], "Query must be less than 500 characters");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let base_url = spawn(Arc::new(StubSearch::returning(0))).await;
    let res = Client::new()
        .post(format!("{}/search", base_url))
        .header("content-type", "application/json")
        .body("{\"query\":")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn twenty_first_request_is_rate_limited() {
    let base_url = spawn(Arc::new(StubSearch::returning(0))).await;

    for i in 0..20 {
        let res = post(&base_url, json!({"query": "hello"})).await;
        assert_eq!(res.status(), StatusCode::OK, "request {} should pass", i + 1);
        let remaining: u32 = res.headers()["x-ratelimit-remaining"]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(remaining, 19 - i);
    }

    let res = post(&base_url, json!({"query": "hello"})).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers()["x-ratelimit-remaining"], "0");
    let retry_header: u64 = res.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_header > 0 && retry_header <= 60);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Too many requests");
    assert_eq!(body["retryAfter"].as_u64().unwrap(), retry_header);
}

#[tokio::test]
async fn search_failure_is_a_server_error_with_message() {
    let base_url = spawn(Arc::new(StubSearch::failing())).await;

    let res = post(&base_url, json!({"query": "hello"})).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.headers().contains_key("x-ratelimit-remaining"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Search failed");
    assert_eq!(body["message"], "database error: connection refused");
}

#[tokio::test]
async fn get_is_not_allowed_and_not_counted() {
    let base_url = spawn(Arc::new(StubSearch::returning(0))).await;

    let res = Client::new()
        .get(format!("{}/search", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(!res.headers().contains_key("x-ratelimit-remaining"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Use POST method for search");

    let res = post(&base_url, json!({"query": "hello"})).await;
    assert_eq!(res.headers()["x-ratelimit-remaining"], "19");
}

#[tokio::test]
async fn api_search_path_shares_the_quota() {
    let base_url = spawn(Arc::new(StubSearch::returning(0))).await;

    post(&base_url, json!({"query": "a"})).await;
    let res = Client::new()
        .post(format!("{}/api/search", base_url))
        .json(&json!({"query": "b"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-ratelimit-remaining"], "18");
}
