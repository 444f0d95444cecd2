use clap::{Parser, ValueEnum};
use std::fmt;

use crate::rate_limit::MAX_WINDOW_SECS;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "docs-site")]
#[command(about = "Documentation site with semantic search over a libSQL article store")]
pub struct Args {
    // Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    // Remote libSQL database (libsql://, https:// or http://)
    #[arg(long, env = "TURSO_DB_URL")]
    pub database_url: Option<String>,

    // Auth token for the remote database
    #[arg(long, env = "TURSO_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    // SQLite file used when no remote database is configured
    #[arg(long, default_value = "local.db")]
    pub local_db: String,

    #[arg(long, env = "EMBEDDING_PROVIDER", value_enum, default_value_t = EmbeddingProvider::Local)]
    pub embedding_provider: EmbeddingProvider,

    // Overrides the provider's default embedding model
    #[arg(long, env = "EMBEDDING_MODEL")]
    pub embedding_model: Option<String>,

    #[arg(long, default_value_t = 768)]
    pub embedding_dimensions: usize,

    // Ollama server backing the local provider
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    // Search rate limit: max requests per window
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..))]
    pub search_rate_limit: u32,

    // Search rate limit window in seconds, at most one week
    #[arg(
        long,
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..=MAX_WINDOW_SECS)
    )]
    pub search_rate_window: u64,

    // Take the client address from X-Forwarded-For / X-Real-IP
    #[arg(long, default_value_t = false)]
    pub trust_proxy: bool,

    // How often expired rate limit windows are dropped (seconds)
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub prune_interval: u64,

    #[arg(long, default_value_t = false)]
    pub log_json: bool,
}

impl Args {
    /// Remote database only when both URL and token are present, as the
    /// hosted store rejects anonymous connections.
    pub fn database_target(&self) -> DatabaseTarget {
        match (&self.database_url, &self.auth_token) {
            (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => {
                DatabaseTarget::Remote {
                    url: url.clone(),
                    auth_token: token.clone(),
                }
            }
            _ => DatabaseTarget::Local {
                path: self.local_db.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Remote { url: String, auth_token: String },
    Local { path: String },
}

/// Backend that turns text into vectors for similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum EmbeddingProvider {
    #[default]
    Local,
    Gemini,
    Openai,
}

impl EmbeddingProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingProvider::Local => "local",
            EmbeddingProvider::Gemini => "gemini",
            EmbeddingProvider::Openai => "openai",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            EmbeddingProvider::Local => "nomic-embed-text",
            EmbeddingProvider::Gemini => "text-embedding-004",
            EmbeddingProvider::Openai => "text-embedding-3-small",
        }
    }
}

impl fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
