//! Price Scout - Concurrent multi-site product search
//!
//! A search query is fanned out to several e-commerce sites at once, each
//! scraped in its own headless browser. The products found are merged into a
//! single list ordered by ascending price and served over HTTP.

// Module declarations
pub mod api;
pub mod crawling;
pub mod domain;
pub mod infrastructure;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{build_router, AppState};
use crate::crawling::{OrchestratorConfig, SearchOrchestrator};
use crate::infrastructure::browser::{BrowserLauncher, ChromiumLauncher};
use crate::infrastructure::config::{ConfigManager, ScrapingConfig};
use crate::infrastructure::logging::{init_logging_with_config, log_system_info};
use crate::infrastructure::sites::SiteRegistry;

// Re-export the main entry points for easier access
pub use crawling::ScrapeJob;
pub use domain::{Product, SearchReport};

/// Build the orchestrator for the enabled built-in sites
pub fn build_orchestrator(
    config: &ScrapingConfig,
    launcher: Arc<dyn BrowserLauncher>,
) -> Result<SearchOrchestrator> {
    let registry = SiteRegistry::builtin()
        .context("Built-in site profiles are invalid")?
        .retain_enabled(&config.enabled_sites);

    Ok(SearchOrchestrator::new(
        Arc::new(registry),
        launcher,
        OrchestratorConfig::from(config),
    ))
}

/// Load configuration, start logging and serve until interrupted
pub async fn run() -> Result<()> {
    let config_manager = ConfigManager::new()?;
    let mut config = config_manager.load_config().await?;
    config.apply_env_overrides();

    init_logging_with_config(&config.logging)?;
    log_system_info();
    info!("Configuration file: {:?}", config_manager.config_path());

    let launcher: Arc<dyn BrowserLauncher> =
        Arc::new(ChromiumLauncher::new(config.scraping.browser.clone()));
    let orchestrator = build_orchestrator(&config.scraping, launcher)?;
    info!("Registered sites: {:?}", orchestrator.registry().names());

    let app = build_router(Arc::new(AppState::new(orchestrator)));

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
