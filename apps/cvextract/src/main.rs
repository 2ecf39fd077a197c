mod config;
mod errors;
mod extraction;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::skills::SkillsMatcher;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (aborts on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Extract API v{}", env!("CARGO_PKG_VERSION"));

    // Load skill dictionaries (a missing file degrades to an empty dictionary)
    let dictionary_paths = config.dictionary_paths();
    let skills = tokio::task::spawn_blocking({
        let threshold = config.fuzzy_match_threshold;
        move || SkillsMatcher::from_paths(&dictionary_paths, threshold)
    })
    .await?;
    info!(
        "Skills matcher ready (fuzzy threshold {}, languages: {:?})",
        skills.fuzzy_threshold(),
        config.supported_languages
    );

    // Build app state
    let state = AppState::new(config.clone(), skills);
    info!("Bulk mode: {} workers, max batch {}", config.parallel_workers, config.max_batch_size);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
