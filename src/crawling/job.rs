//! Scrape job: the failure boundary of one site's search
//!
//! Errors and panics from the session are caught here, logged with the site
//! name and turned into a tagged [`SiteOutcome`]. Nothing propagates upward.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};

use super::session::SiteSession;
use crate::domain::{Product, SiteOutcome};
use crate::infrastructure::browser::BrowserLauncher;
use crate::infrastructure::sites::SiteProfile;

pub struct ScrapeJob {
    session: SiteSession,
}

impl ScrapeJob {
    pub fn new(
        site: Arc<SiteProfile>,
        launcher: Arc<dyn BrowserLauncher>,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            session: SiteSession::new(site, launcher, navigation_timeout),
        }
    }

    pub fn site_name(&self) -> &str {
        &self.session.site().name
    }

    /// Run the site's session, converting any failure into an outcome
    pub async fn run(&self, query: &str) -> SiteOutcome {
        let span = info_span!("site", site = %self.site_name());

        async {
            let result = AssertUnwindSafe(self.session.run(query)).catch_unwind().await;
            match result {
                Ok(Ok(outcome)) => {
                    if let SiteOutcome::Completed(products) = &outcome {
                        info!("Found {} products", products.len());
                    }
                    outcome
                }
                Ok(Err(e)) => {
                    warn!("Error scraping {}: {}", self.site_name(), e);
                    SiteOutcome::Failed(e.to_string())
                }
                Err(panic) => {
                    let message = panic_message(&*panic);
                    warn!("Scraper for {} crashed: {}", self.site_name(), message);
                    SiteOutcome::Failed(format!("scraper panicked: {message}"))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Products found for `query`; empty on any failure
    pub async fn execute(&self, query: &str) -> Vec<Product> {
        self.run(query).await.into_products()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
