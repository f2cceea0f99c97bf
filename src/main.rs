use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_night_api::{
    config::Config,
    db::{
        create_pool, create_redis_client, Cache, CacheWriterHandle, MemoryRepository,
        PgRepository, Repository,
    },
    routes::{create_router, AppState},
    services::providers::{CachedLookup, MovieLookup, TmdbLookup},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_night_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let repo: Arc<dyn Repository> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            tracing::info!("Database connection established");
            Arc::new(PgRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; data is kept in memory only");
            Arc::new(MemoryRepository::new())
        }
    };

    let (lookup, cache_writer) = build_lookup(&config)?;
    if lookup.is_none() {
        tracing::warn!("TMDB_ACCESS_TOKEN not set; movie search and import are disabled");
    }

    let state = Arc::new(AppState::new(&config, repo, lookup));
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(
        addr = %addr,
        allow_repick = config.allow_repick,
        base_rotations = config.base_rotations,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

/// TMDB lookup, wrapped in the Redis cache when one is configured
fn build_lookup(
    config: &Config,
) -> anyhow::Result<(Option<Arc<dyn MovieLookup>>, Option<CacheWriterHandle>)> {
    let Some(token) = config.tmdb_access_token.clone() else {
        return Ok((None, None));
    };
    let tmdb: Arc<dyn MovieLookup> = Arc::new(TmdbLookup::new(token, config.tmdb_api_url.clone()));

    let Some(redis_url) = &config.redis_url else {
        tracing::info!("REDIS_URL not set; TMDB lookups are not cached");
        return Ok((Some(tmdb), None));
    };

    let client = create_redis_client(redis_url)?;
    let (cache, writer) = Cache::new(client);
    tracing::info!("Redis cache enabled");

    let cached = CachedLookup::new(
        tmdb,
        cache,
        config.search_cache_ttl_secs,
        config.details_cache_ttl_secs,
    );
    Ok((Some(Arc::new(cached)), Some(writer)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
