//! Main entry point for the Prompt Gallery service

use prompt_gallery::{
    api,
    config::{LoggingConfig, Settings},
    AppState,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "pretty" {
        registry.with(fmt::layer().pretty()).init();
    } else {
        registry.with(fmt::layer().json()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    init_tracing(&settings.logging);
    settings.validate()?;

    info!(
        "Loaded configuration: server={}:{} storage={:?} database={:?}",
        settings.server.host,
        settings.server.port,
        settings.storage.backend,
        settings.database.backend
    );
    if settings.trusts_unverified_identity() {
        warn!(
            "No proxy API key is enforced: identity headers are trusted from any caller. \
             Set auth.api_keys (PROMPT_GALLERY__AUTH__API_KEYS) for the identity proxy."
        );
    }

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    // Collaborators are built once here and injected into the handlers
    let app_state = Arc::new(AppState::from_settings(settings)?);
    let app = api::create_router(app_state);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
