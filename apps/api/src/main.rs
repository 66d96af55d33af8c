mod config;
mod errors;
mod generator;
mod recommendation;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::recommendation::reference::ReferenceDataset;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparsable env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting recommender v{}", env!("CARGO_PKG_VERSION"));

    for (mode, generator) in [
        ("preferences", &config.preference_generator),
        ("profiles", &config.profile_generator),
    ] {
        info!(
            "Generator for {mode}: {} {} {} (prompt via {:?}, timeout {}s, re-prompts {})",
            generator.binary.display(),
            generator.base_args.join(" "),
            generator.model,
            generator.delivery,
            generator.timeout.as_secs(),
            generator.malformed_retries
        );
    }

    // Reference dataset is optional; without it the colleges endpoint reports a configuration error
    let reference = match &config.reference_dataset_path {
        Some(path) => {
            let dataset = ReferenceDataset::load(path)?;
            if dataset.is_empty() {
                warn!("Reference dataset {} has no records", path.display());
            }
            Some(dataset)
        }
        None => {
            warn!("REFERENCE_DATASET_PATH not set; profile recommendations are disabled");
            None
        }
    };

    let state = AppState::new(config.clone(), reference);

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
