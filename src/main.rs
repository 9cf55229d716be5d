mod config;
mod heuristics;
mod imaging;
mod llm_extract;
mod material;
mod session;
mod sheets_hub;
mod web;

use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use llm_extract::ChatVisionExtractor;
use session::SessionStore;
use sheets_hub::SheetsSink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Install crypto provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cfg_path = config::Config::default_path();
    let cfg = config::Config::load(&cfg_path)?;
    info!(
        config = %cfg_path.display(),
        backend = ?cfg.llm.backend,
        sheet = %cfg.sheets.sheet_name,
        "Configuration loaded"
    );

    let extractor = ChatVisionExtractor::from_config(&cfg.llm)?;
    let sink = SheetsSink::connect(&cfg.sheets).await?;

    let state = web::AppState {
        sessions: Arc::new(SessionStore::new(Duration::from_secs(
            cfg.server.session_idle_minutes * 60,
        ))),
        extractor: Arc::new(extractor),
        sink: Arc::new(sink),
        image: cfg.image.clone(),
    };

    web::run_server(&cfg, state).await
}
