use anyhow::Result;
use tracing;
use tracing_subscriber;
use whatsport_api::run as run_api;
use whatsport_core::{AppContext, Config};
use whatsport_outbox::run as run_outbox;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting WhatSport server");

    let config = Config::from_env();

    let database_url = config.database.url.clone();
    tokio::task::spawn_blocking(move || whatsport_core::db::run_migrations(&database_url))
        .await??;

    let ctx = AppContext::connect(config).await?;

    tracing::info!("Application context initialized");

    let ctx_clone = ctx.clone();
    tokio::spawn(async move {
        if let Err(e) = run_outbox(ctx_clone).await {
            tracing::error!("Outbox dispatcher error: {}", e);
        }
    });

    // API server runs in the main task
    run_api(ctx).await?;

    Ok(())
}
