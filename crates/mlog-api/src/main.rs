//! Machine-log dashboard API server.

use mlog_api::config::ApiConfig;
use mlog_api::server::{self, AppState};
use mlog_scheduler::{InMemoryScheduler, NoticeBoard};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;
    let store = config.build_store()?;
    let notices = Arc::new(NoticeBoard::new(config.notice_ttl));
    let scheduler = Arc::new(InMemoryScheduler::new(
        Arc::clone(&store),
        Some(Arc::clone(&notices)),
    ));
    if !store.check_availability().await {
        tracing::warn!("key-value contract reports itself unavailable at startup");
    }

    let state = Arc::new(AppState::new(store, scheduler, notices));
    let app = server::router(state);
    tracing::info!(backend = ?config.backend, "machine-log API listening on {}", config.listen);
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
