use async_trait::async_trait;
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use super::{ARTICLE_COLUMNS, ContentStore, parse_tags};
use crate::error::AppError;
use crate::models::{Article, SearchResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    folder TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    embedding BLOB,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

#[derive(Debug, FromRow)]
struct ArticleRow {
    id: i64,
    slug: String,
    title: String,
    content: String,
    folder: Option<String>,
    tags: String,
    created_at: String,
    updated_at: String,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            slug: row.slug,
            title: row.title,
            content: row.content,
            folder: row.folder,
            tags: parse_tags(&row.tags),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct EmbeddedRow {
    #[sqlx(flatten)]
    article: ArticleRow,
    embedding: Vec<u8>,
}

/// Article to seed a local store with in tests; the site itself never writes.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct NewArticle {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub folder: Option<String>,
    pub tags: Vec<String>,
    pub embedding: Option<Vec<f32>>,
}

/// SQLite-file store used for development and CI when no hosted database
/// is configured.
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub async fn open(path: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, AppError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) async fn upsert_article(&self, article: &NewArticle) -> Result<(), AppError> {
        let tags = serde_json::to_string(&article.tags)
            .map_err(|e| AppError::decode("tags", e))?;
        let embedding = article.embedding.as_deref().map(encode_vector);

        sqlx::query(
            r#"
            INSERT INTO articles (slug, title, content, folder, tags, embedding)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(slug) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                folder = excluded.folder,
                tags = excluded.tags,
                embedding = excluded.embedding,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&article.slug)
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.folder)
        .bind(tags)
        .bind(embedding)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for LocalStore {
    async fn all_articles(&self) -> Result<Vec<Article>, AppError> {
        let rows: Vec<ArticleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM articles ORDER BY folder, title",
            ARTICLE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn article_by_slug(&self, slug: &str) -> Result<Option<Article>, AppError> {
        let row: Option<ArticleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM articles WHERE slug = ?1",
            ARTICLE_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Article::from))
    }

    async fn articles_by_folder(&self, folder: &str) -> Result<Vec<Article>, AppError> {
        let rows: Vec<ArticleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM articles WHERE folder = ?1 ORDER BY title",
            ARTICLE_COLUMNS
        ))
        .bind(folder)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn folders(&self) -> Result<Vec<String>, AppError> {
        let folders: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT folder FROM articles WHERE folder IS NOT NULL ORDER BY folder",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(folders.into_iter().map(|(f,)| f).collect())
    }

    #[tracing::instrument(skip(self, embedding), fields(dims = embedding.len()))]
    async fn nearest(&self, embedding: &[f32], limit: u32) -> Result<Vec<SearchResult>, AppError> {
        let rows: Vec<EmbeddedRow> = sqlx::query_as(&format!(
            "SELECT {}, embedding FROM articles WHERE embedding IS NOT NULL",
            ARTICLE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<SearchResult> = rows
            .into_iter()
            .filter_map(|row| {
                let stored = decode_vector(&row.embedding);
                // skip rows embedded with a different model
                if stored.len() != embedding.len() {
                    return None;
                }
                let distance = cosine_distance(embedding, &stored);
                let article = Article::from(row.article);
                Some(SearchResult {
                    id: article.id,
                    slug: article.slug,
                    title: article.title,
                    content: article.content,
                    folder: article.folder,
                    tags: article.tags,
                    distance,
                    created_at: article.created_at,
                    updated_at: article.updated_at,
                })
            })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(limit as usize);
        Ok(scored)
    }
}

// Same layout libSQL uses for F32_BLOB columns
#[cfg(test)]
fn encode_vector(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// 1 - cosine similarity; zero vectors are treated as maximally distant.
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 1.0;
    }
    1.0 - dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> LocalStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        LocalStore::from_pool(pool).await.unwrap()
    }

    fn article(slug: &str, folder: Option<&str>, embedding: Option<Vec<f32>>) -> NewArticle {
        NewArticle {
            slug: slug.to_string(),
            title: format!("Title {}", slug),
            content: format!("# {}\n\nBody", slug),
            folder: folder.map(str::to_string),
            tags: vec!["docs".to_string()],
            embedding,
        }
    }

    #[test]
    fn vector_blob_layout_is_little_endian_f32() {
        let v = vec![1.0f32, -2.5, 0.125];
        let bytes = encode_vector(&v);
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(decode_vector(&bytes), v);
    }

    #[test]
    fn cosine_distance_bounds() {
        assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-9);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-9);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-9);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[tokio::test]
    async fn fetches_by_slug_and_folder() {
        let store = store().await;
        store.upsert_article(&article("intro", None, None)).await.unwrap();
        store
            .upsert_article(&article("guides/setup", Some("guides"), None))
            .await
            .unwrap();

        let found = store.article_by_slug("guides/setup").await.unwrap().unwrap();
        assert_eq!(found.title, "Title guides/setup");
        assert_eq!(found.tags, vec!["docs"]);
        assert!(store.article_by_slug("missing").await.unwrap().is_none());

        assert_eq!(store.all_articles().await.unwrap().len(), 2);
        assert_eq!(store.articles_by_folder("guides").await.unwrap().len(), 1);
        assert_eq!(store.folders().await.unwrap(), vec!["guides"]);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_slug() {
        let store = store().await;
        store.upsert_article(&article("intro", None, None)).await.unwrap();
        let mut changed = article("intro", Some("root"), None);
        changed.title = "Introduction".to_string();
        store.upsert_article(&changed).await.unwrap();

        let all = store.all_articles().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Introduction");
    }

    #[tokio::test]
    async fn nearest_orders_by_distance_and_honours_limit() {
        let store = store().await;
        store
            .upsert_article(&article("far", None, Some(vec![0.0, 1.0])))
            .await
            .unwrap();
        store
            .upsert_article(&article("near", None, Some(vec![1.0, 0.1])))
            .await
            .unwrap();
        store
            .upsert_article(&article("wrong-dims", None, Some(vec![1.0, 0.0, 0.0])))
            .await
            .unwrap();
        store.upsert_article(&article("unembedded", None, None)).await.unwrap();

        let hits = store.nearest(&[1.0, 0.0], 10).await.unwrap();
        let slugs: Vec<_> = hits.iter().map(|h| h.slug.as_str()).collect();
        assert_eq!(slugs, vec!["near", "far"]);

        let hits = store.nearest(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn open_creates_database_file_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.db");
        let path = path.to_str().unwrap();

        let store = LocalStore::open(path).await.unwrap();
        store.upsert_article(&article("intro", None, None)).await.unwrap();
        drop(store);

        let reopened = LocalStore::open(path).await.unwrap();
        assert!(reopened.article_by_slug("intro").await.unwrap().is_some());
    }
}
