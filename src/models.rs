use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_QUERY_CHARS: usize = 500;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 20;

// Article as stored in the content database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub folder: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

// One search hit, closest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub folder: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub distance: f64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub count: usize,
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitedBody {
    pub error: String,
    pub message: String,
    pub retry_after: u64,
}

/// Validated search input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub limit: u32,
}

/// Why a search body was refused. Each maps to a 400.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidSearch {
    MalformedBody(String),
    MissingQuery,
    QueryTooLong,
    InvalidLimit,
}

impl InvalidSearch {
    pub fn into_body(self) -> ErrorBody {
        match self {
            InvalidSearch::MalformedBody(reason) => ErrorBody {
                error: "Invalid request body".to_string(),
                message: Some(reason),
            },
            InvalidSearch::MissingQuery => ErrorBody {
                error: "Query parameter is required".to_string(),
                message: None,
            },
            InvalidSearch::QueryTooLong => ErrorBody {
                error: "Query too long".to_string(),
                message: Some(format!(
                    "Query must be less than {} characters",
                    MAX_QUERY_CHARS
                )),
            },
            InvalidSearch::InvalidLimit => ErrorBody {
                error: "Invalid limit".to_string(),
                message: Some("Limit must be a number".to_string()),
            },
        }
    }
}

impl SearchParams {
    /// Parse a raw request body. The body is read as loose JSON rather than
    /// a typed struct so a non-string `query` gets the same answer as a
    /// missing one.
    pub fn from_body(body: &[u8]) -> Result<Self, InvalidSearch> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| InvalidSearch::MalformedBody(e.to_string()))?;

        let query = match value.get("query") {
            Some(Value::String(q)) if !q.is_empty() => q.clone(),
            _ => return Err(InvalidSearch::MissingQuery),
        };

        // counted in UTF-16 code units, the way browsers count input length
        if query.encode_utf16().count() > MAX_QUERY_CHARS {
            return Err(InvalidSearch::QueryTooLong);
        }

        let limit = match value.get("limit") {
            None => DEFAULT_LIMIT,
            // an explicit null counts as zero and is clamped up
            Some(Value::Null) => clamp_limit(0.0),
            Some(Value::Number(n)) => clamp_limit(n.as_f64().unwrap_or(1.0)),
            Some(_) => return Err(InvalidSearch::InvalidLimit),
        };

        Ok(Self { query, limit })
    }
}

// Keep result counts bounded no matter what the caller asked for
fn clamp_limit(requested: f64) -> u32 {
    if requested.is_nan() {
        return 1;
    }
    requested.floor().clamp(1.0, MAX_LIMIT as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<SearchParams, InvalidSearch> {
        SearchParams::from_body(value.to_string().as_bytes())
    }

    #[test]
    fn rejects_missing_empty_and_non_string_query() {
        assert_eq!(parse(json!({})), Err(InvalidSearch::MissingQuery));
        assert_eq!(parse(json!({"query": ""})), Err(InvalidSearch::MissingQuery));
        assert_eq!(parse(json!({"query": 42})), Err(InvalidSearch::MissingQuery));
        assert_eq!(
            parse(json!({"query": ["a"]})),
            Err(InvalidSearch::MissingQuery)
        );
    }

    #[test]
    fn query_length_boundary() {
        let ok = "a".repeat(500);
        assert_eq!(parse(json!({"query": ok})).unwrap().query.len(), 500);

        let long = "a".repeat(501);
        assert_eq!(parse(json!({"query": long})), Err(InvalidSearch::QueryTooLong));
    }

    #[test]
    fn query_length_counts_utf16_units() {
        let accented = "é".repeat(500);
        assert!(parse(json!({"query": accented})).is_ok());

        // each emoji is a surrogate pair
        let emoji = "😀".repeat(300);
        assert_eq!(parse(json!({"query": emoji})), Err(InvalidSearch::QueryTooLong));
        let emoji = "😀".repeat(250);
        assert!(parse(json!({"query": emoji})).is_ok());
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(parse(json!({"query": "x", "limit": 0})).unwrap().limit, 1);
        assert_eq!(parse(json!({"query": "x", "limit": -3})).unwrap().limit, 1);
        assert_eq!(parse(json!({"query": "x", "limit": 1000})).unwrap().limit, 20);
        assert_eq!(parse(json!({"query": "x", "limit": 5})).unwrap().limit, 5);
        assert_eq!(parse(json!({"query": "x", "limit": 7.9})).unwrap().limit, 7);
        assert_eq!(parse(json!({"query": "x"})).unwrap().limit, 10);
        assert_eq!(parse(json!({"query": "x", "limit": null})).unwrap().limit, 1);
    }

    #[test]
    fn non_numeric_limit_is_rejected() {
        assert_eq!(
            parse(json!({"query": "x", "limit": "5"})),
            Err(InvalidSearch::InvalidLimit)
        );
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = SearchParams::from_body(b"{not json").unwrap_err();
        assert!(matches!(err, InvalidSearch::MalformedBody(_)));
    }

    #[test]
    fn rate_limited_body_uses_camel_case() {
        let body = RateLimitedBody {
            error: "Too many requests".into(),
            message: "slow down".into(),
            retry_after: 12,
        };
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["retryAfter"], 12);
    }
}
