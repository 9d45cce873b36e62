//! # samlsp-server
//!
//! Main entry point for the SAML service provider demo server.

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use samlsp_axum::{SamlSp, SessionManager};
use samlsp_core::SamlSettings;
use samlsp_server::{app_router, register_listeners, ServerConfig};
use samlsp_session::MemorySessionStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let settings = SamlSettings::from_env()?;

    tracing::info!(metadata_url = %settings.metadata_url, "SAML service provider starting...");

    let sp = register_listeners(SamlSp::builder(settings)).init().await?;

    let store = Arc::new(MemorySessionStore::new());
    let janitor = store.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(300));
        loop {
            tick.tick().await;
            janitor.purge_expired();
        }
    });

    let sessions = SessionManager::new(store).with_cookie(config.session_cookie());
    let app = app_router(&sp, sessions);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app).await?;
    Ok(())
}
