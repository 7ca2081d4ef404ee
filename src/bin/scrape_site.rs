//! Run one site's scrape against a real browser and print what it finds
//!
//! Usage: scrape_site <site> <query...>

use anyhow::{bail, Context, Result};
use std::sync::Arc;

use price_scout::infrastructure::browser::{BrowserLauncher, ChromiumLauncher};
use price_scout::infrastructure::config::ConfigManager;
use price_scout::infrastructure::logging::init_logging_with_config;
use price_scout::infrastructure::sites::SiteRegistry;
use price_scout::ScrapeJob;

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(site_name) = args.next() else {
        bail!("usage: scrape_site <site> <query...>");
    };
    let query = args.collect::<Vec<_>>().join(" ");
    if query.trim().is_empty() {
        bail!("usage: scrape_site <site> <query...>");
    }

    let config = ConfigManager::new()?.load_config().await?;
    let mut logging = config.logging.clone();
    logging.file_output = false;
    logging.console_output = true;
    init_logging_with_config(&logging)?;

    let registry = SiteRegistry::builtin().context("Built-in site profiles are invalid")?;
    let Some(site) = registry.get(&site_name) else {
        bail!("unknown site {site_name:?}, expected one of {:?}", registry.names());
    };

    let launcher: Arc<dyn BrowserLauncher> =
        Arc::new(ChromiumLauncher::new(config.scraping.browser.clone()));
    let job = ScrapeJob::new(site, launcher, config.scraping.navigation_timeout());

    let mut products = job.execute(&query).await;
    products.sort_by(|a, b| a.price_whole().total_cmp(&b.price_whole()));

    for product in &products {
        println!("{product}");
    }
    println!("{} products", products.len());
    Ok(())
}
