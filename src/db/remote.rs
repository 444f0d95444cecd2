//! Hosted libSQL over its HTTP pipeline API.
//!
//! Each call sends one `execute` followed by `close` to `/v2/pipeline`, so no
//! stream state is kept between requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ARTICLE_COLUMNS, ContentStore, parse_tags};
use crate::error::AppError;
use crate::models::{Article, SearchResult};

// Vector index the indexer creates over articles.embedding
const VECTOR_INDEX: &str = "articles_embedding_idx";

#[derive(Debug, Serialize)]
struct PipelineRequest<'a> {
    requests: Vec<StreamRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamRequest<'a> {
    Execute { stmt: Statement<'a> },
    Close,
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    sql: &'a str,
    args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Value {
    Null,
    // integers travel as strings to keep 64-bit precision
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    Blob { base64: String },
}

#[derive(Debug, Deserialize)]
struct PipelineResponse {
    results: Vec<StreamResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResult {
    Ok { response: StreamResponse },
    Error { error: StreamError },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResponse {
    Execute { result: ResultSet },
    Close,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ResultSet {
    cols: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Column {
    name: Option<String>,
}

impl ResultSet {
    fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            cols: &self.cols,
            values,
        })
    }
}

struct Row<'a> {
    cols: &'a [Column],
    values: &'a [Value],
}

impl Row<'_> {
    fn get(&self, name: &'static str) -> Result<&Value, AppError> {
        self.cols
            .iter()
            .position(|c| c.name.as_deref() == Some(name))
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| AppError::decode("row", format!("missing column {}", name)))
    }

    fn text(&self, name: &'static str) -> Result<String, AppError> {
        self.opt_text(name)?
            .ok_or_else(|| AppError::decode("row", format!("column {} is null", name)))
    }

    fn opt_text(&self, name: &'static str) -> Result<Option<String>, AppError> {
        match self.get(name)? {
            Value::Null => Ok(None),
            Value::Text { value } => Ok(Some(value.clone())),
            other => Err(AppError::decode(
                "row",
                format!("column {} is not text: {:?}", name, other),
            )),
        }
    }

    fn integer(&self, name: &'static str) -> Result<i64, AppError> {
        match self.get(name)? {
            Value::Integer { value } => value
                .parse()
                .map_err(|e| AppError::decode("row", format!("column {}: {}", name, e))),
            other => Err(AppError::decode(
                "row",
                format!("column {} is not an integer: {:?}", name, other),
            )),
        }
    }

    fn float(&self, name: &'static str) -> Result<f64, AppError> {
        match self.get(name)? {
            Value::Float { value } => Ok(*value),
            Value::Integer { value } => value
                .parse()
                .map_err(|e| AppError::decode("row", format!("column {}: {}", name, e))),
            other => Err(AppError::decode(
                "row",
                format!("column {} is not a number: {:?}", name, other),
            )),
        }
    }

    fn article(&self) -> Result<Article, AppError> {
        Ok(Article {
            id: self.integer("id")?,
            slug: self.text("slug")?,
            title: self.text("title")?,
            content: self.text("content")?,
            folder: self.opt_text("folder")?,
            tags: self
                .opt_text("tags")?
                .map(|t| parse_tags(&t))
                .unwrap_or_default(),
            created_at: self.text("created_at")?,
            updated_at: self.text("updated_at")?,
        })
    }

    fn search_result(&self) -> Result<SearchResult, AppError> {
        let article = self.article()?;
        Ok(SearchResult {
            id: article.id,
            slug: article.slug,
            title: article.title,
            content: article.content,
            folder: article.folder,
            tags: article.tags,
            distance: self.float("distance")?,
            created_at: article.created_at,
            updated_at: article.updated_at,
        })
    }
}

pub struct RemoteStore {
    client: reqwest::Client,
    pipeline_url: String,
    auth_token: String,
}

impl RemoteStore {
    pub fn new(client: reqwest::Client, url: &str, auth_token: &str) -> Self {
        Self {
            client,
            pipeline_url: pipeline_url(url),
            auth_token: auth_token.to_string(),
        }
    }

    async fn execute(&self, sql: &str, args: Vec<Value>) -> Result<ResultSet, AppError> {
        let body = PipelineRequest {
            requests: vec![
                StreamRequest::Execute {
                    stmt: Statement { sql, args },
                },
                StreamRequest::Close,
            ],
        };

        let res = self
            .client
            .post(&self.pipeline_url)
            .bearer_auth(&self.auth_token)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::Database(format!("{}: {}", status, text)));
        }

        let pipeline: PipelineResponse = res.json().await?;
        first_result_set(pipeline)
    }
}

// libsql:// is the client-side scheme; over HTTP it is plain https
fn pipeline_url(url: &str) -> String {
    let base = match url.strip_prefix("libsql://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    };
    format!("{}/v2/pipeline", base.trim_end_matches('/'))
}

fn first_result_set(pipeline: PipelineResponse) -> Result<ResultSet, AppError> {
    match pipeline.results.into_iter().next() {
        Some(StreamResult::Ok {
            response: StreamResponse::Execute { result },
        }) => Ok(result),
        Some(StreamResult::Ok { .. }) => Err(AppError::Database(
            "unexpected response to execute".to_string(),
        )),
        Some(StreamResult::Error { error }) => Err(AppError::Database(error.message)),
        None => Err(AppError::Database("empty pipeline response".to_string())),
    }
}

fn text(value: &str) -> Value {
    Value::Text {
        value: value.to_string(),
    }
}

#[async_trait]
impl ContentStore for RemoteStore {
    async fn all_articles(&self) -> Result<Vec<Article>, AppError> {
        let sql = format!("SELECT {} FROM articles ORDER BY folder, title", ARTICLE_COLUMNS);
        let rs = self.execute(&sql, vec![]).await?;
        rs.rows().map(|r| r.article()).collect()
    }

    async fn article_by_slug(&self, slug: &str) -> Result<Option<Article>, AppError> {
        let sql = format!("SELECT {} FROM articles WHERE slug = ?", ARTICLE_COLUMNS);
        let rs = self.execute(&sql, vec![text(slug)]).await?;
        rs.rows().next().map(|r| r.article()).transpose()
    }

    async fn articles_by_folder(&self, folder: &str) -> Result<Vec<Article>, AppError> {
        let sql = format!(
            "SELECT {} FROM articles WHERE folder = ? ORDER BY title",
            ARTICLE_COLUMNS
        );
        let rs = self.execute(&sql, vec![text(folder)]).await?;
        rs.rows().map(|r| r.article()).collect()
    }

    async fn folders(&self) -> Result<Vec<String>, AppError> {
        let rs = self
            .execute(
                "SELECT DISTINCT folder FROM articles WHERE folder IS NOT NULL ORDER BY folder",
                vec![],
            )
            .await?;
        rs.rows().map(|r| r.text("folder")).collect()
    }

    #[tracing::instrument(skip(self, embedding), fields(dims = embedding.len()))]
    async fn nearest(&self, embedding: &[f32], limit: u32) -> Result<Vec<SearchResult>, AppError> {
        let vector = serde_json::to_string(embedding)
            .map_err(|e| AppError::decode("query vector", e))?;
        let sql = format!(
            "SELECT a.id, a.slug, a.title, a.content, a.folder, a.tags, a.created_at, a.updated_at, \
             vector_distance_cos(a.embedding, vector32(?1)) AS distance \
             FROM vector_top_k('{}', vector32(?1), ?2) AS v \
             JOIN articles a ON a.rowid = v.id \
             ORDER BY distance ASC",
            VECTOR_INDEX
        );
        let rs = self
            .execute(
                &sql,
                vec![
                    Value::Text { value: vector },
                    Value::Integer {
                        value: limit.to_string(),
                    },
                ],
            )
            .await?;
        rs.rows().map(|r| r.search_result()).collect()
    }
}
