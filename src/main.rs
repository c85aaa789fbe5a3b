use std::net::SocketAddr;

use anyhow::Context;
use aqario::config::AppConfig;
use aqario::services::entity_store::HttpEntityStore;
use aqario::{routes, AppState};
use mimalloc::MiMalloc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aqario=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env().context("ENTITY_STORE_URL must be set")?;
    let store = HttpEntityStore::from_config(&config).context("Failed to build entity store client")?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    tracing::info!(
        host = %addr,
        entity_store = %store.base_url(),
        stats_source = ?config.stats_source,
        overdue_policy = ?config.overdue_policy,
        "Starting Aqario dashboard gateway"
    );

    let app = routes::router(AppState { config, store });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
