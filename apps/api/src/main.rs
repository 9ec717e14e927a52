mod config;
mod errors;
mod ingest;
mod matching;
mod models;
mod routes;
mod skills;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, EmbeddingBackend};
use crate::matching::{FastEmbedEncoder, HashingEncoder, SemanticMatcher};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobmatch API v{}", env!("CARGO_PKG_VERSION"));

    // The encoder is loaded exactly once; a load failure stops startup.
    let matcher = build_matcher(&config).await?;
    info!(
        "Semantic matcher ready (model: {}, {} dimensions)",
        matcher.model_name(),
        matcher.dimension()
    );
    info!(
        "Context verification: threshold {}, penalty {}, evidence cap {}",
        config.context_threshold, config.context_penalty, config.evidence_max_lines
    );

    let state = AppState::new(config.clone(), matcher);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_matcher(config: &Config) -> Result<SemanticMatcher> {
    match config.embedding_backend {
        EmbeddingBackend::FastEmbed => {
            let cache_dir = config.embedding_cache_dir.clone();
            let encoder = tokio::task::spawn_blocking(move || FastEmbedEncoder::load(cache_dir)).await??;
            Ok(SemanticMatcher::new(encoder))
        }
        EmbeddingBackend::Hashing => Ok(SemanticMatcher::new(HashingEncoder::default())),
    }
}
