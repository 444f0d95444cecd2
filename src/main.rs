use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use docs_site::build_router;
use docs_site::config::Args;
use docs_site::db;
use docs_site::embedding::{EmbedderRegistry, EmbeddingOptions, build_embedder};
use docs_site::rate_limit::{InMemoryRateLimiter, RateLimitConfig, RateLimiter, pruner};
use docs_site::search::VectorSearch;
use docs_site::state::AppState;

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docs_site=info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // parse cli arguments
    let args = Args::parse();
    init_tracing(args.log_json);

    let client = reqwest::Client::new();

    let store = db::connect(&args.database_target(), client.clone()).await?;

    // only the configured provider gets built
    let mut embedders = EmbedderRegistry::new();
    embedders.register(build_embedder(&args, client.clone())?);
    let search = Arc::new(VectorSearch::new(Arc::clone(&store), embedders));

    let rate_limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::new());

    // creating shared state
    let state = Arc::new(AppState {
        store,
        search,
        rate_limiter: Arc::clone(&rate_limiter),
        search_quota: RateLimitConfig::new(args.search_rate_limit, args.search_rate_window),
        embedding: EmbeddingOptions {
            provider: args.embedding_provider,
            dimensions: args.embedding_dimensions,
        },
        trust_proxy: args.trust_proxy,
    });

    // spawn the background pruner
    let prune_every = Duration::from_secs(args.prune_interval.max(1));
    tokio::spawn(async move {
        pruner(rate_limiter, prune_every).await;
    });

    let app = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        addr = %addr,
        provider = %args.embedding_provider,
        rate_limit = args.search_rate_limit,
        rate_window = args.search_rate_window,
        "docs site listening"
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
