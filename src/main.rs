use std::{process, sync::Arc};

use clap::Parser;
use edicola::{
    application::{error::AppError, listing::ListingService},
    cache::{KeyValueCache, MemoryCache},
    config::{self, CliArgs},
    infra::{
        db::PostgresArticles,
        error::InfraError,
        http::{HttpState, build_router},
        redis::RedisCache,
        telemetry,
    },
};
use tokio::net::TcpListener;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let cli = CliArgs::parse();
    let settings = config::load(&cli)?;

    telemetry::init(&settings.logging)?;

    let pool = PostgresArticles::connect(
        &settings.database.url,
        settings.database.max_connections.get(),
    )
    .await?;
    PostgresArticles::run_migrations(&pool).await?;
    let db = Arc::new(PostgresArticles::new(pool, settings.listing.page_size));

    let cache: Arc<dyn KeyValueCache> = match &settings.cache.url {
        Some(url) => {
            info!("using shared redis cache");
            Arc::new(RedisCache::connect(url).await?)
        }
        None => {
            info!("no cache url configured, using process-local cache");
            let memory = MemoryCache::new();
            spawn_cache_sweeper(memory.clone(), settings.listing.ttl);
            Arc::new(memory)
        }
    };

    let listing = Arc::new(ListingService::new(
        db.clone(),
        cache,
        settings.listing.listing_config(),
    ));

    let router = build_router(HttpState { listing, db });

    let listener = TcpListener::bind(settings.server.bind)
        .await
        .map_err(InfraError::from)?;
    info!(
        addr = %settings.server.bind,
        page_size = settings.listing.page_size.get(),
        ttl_secs = settings.listing.ttl.as_secs(),
        "serving article listings"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InfraError::from)?;

    Ok(())
}

/// Expired entries are invisible to reads; the sweep only reclaims memory.
fn spawn_cache_sweeper(cache: MemoryCache, interval: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            cache.evict_expired().await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to install shutdown signal handler");
        return;
    }
    info!("shutdown signal received");
}
