//! Single-site browser session
//!
//! Navigates an exclusively owned browser to the site's search URL, waits
//! according to the site's readiness policy and runs the site's extractor on
//! the rendered document.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use crate::domain::SiteOutcome;
use crate::infrastructure::browser::{
    BrowserError, BrowserGuard, BrowserLauncher, BrowserSession,
};
use crate::infrastructure::sites::{ReadinessPolicy, SiteProfile};

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("Navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },
}

pub struct SiteSession {
    site: Arc<SiteProfile>,
    launcher: Arc<dyn BrowserLauncher>,
    navigation_timeout: Duration,
}

impl SiteSession {
    pub fn new(
        site: Arc<SiteProfile>,
        launcher: Arc<dyn BrowserLauncher>,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            site,
            launcher,
            navigation_timeout,
        }
    }

    pub fn site(&self) -> &SiteProfile {
        &self.site
    }

    /// Scrape the site's results for `query`.
    ///
    /// A readiness wait that runs out yields [`SiteOutcome::NotReady`]; every
    /// other problem is an error. The browser is closed before returning on
    /// both paths.
    pub async fn run(&self, query: &str) -> Result<SiteOutcome, ScrapeError> {
        let url = self.site.search_url(query);
        let mut guard = BrowserGuard::acquire(&self.launcher, self.site.name.as_str()).await?;

        let result = match guard.session() {
            Ok(session) => self.scrape(session, &url).await,
            Err(e) => Err(e.into()),
        };

        guard.release().await;
        result
    }

    async fn scrape(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
    ) -> Result<SiteOutcome, ScrapeError> {
        debug!("Opening {}", url);
        timeout(self.navigation_timeout, session.navigate(url))
            .await
            .map_err(|_| ScrapeError::NavigationTimeout {
                url: url.to_string(),
                timeout: self.navigation_timeout,
            })??;

        if !self.wait_until_ready(session).await? {
            info!("Results did not render in time, reporting no products");
            return Ok(SiteOutcome::NotReady);
        }

        let html = session.content().await?;
        let products = self.site.extractor.extract_html(&html);
        Ok(SiteOutcome::Completed(products))
    }

    async fn wait_until_ready(
        &self,
        session: &mut dyn BrowserSession,
    ) -> Result<bool, ScrapeError> {
        match &self.site.readiness {
            ReadinessPolicy::Settle(delay) => {
                sleep(*delay).await;
                Ok(true)
            }
            ReadinessPolicy::WaitForSelector {
                selector,
                timeout: bound,
            } => match timeout(*bound, session.wait_for_selector(selector, *bound)).await {
                Ok(ready) => Ok(ready?),
                Err(_) => Ok(false),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        fixture_site, fixture_site_with, listing_html, ScriptedLauncher, SessionScript,
    };

    fn session_for(site: SiteProfile, launcher: &ScriptedLauncher) -> SiteSession {
        SiteSession::new(
            Arc::new(site),
            Arc::new(launcher.clone()),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn extracts_products_and_releases_browser() {
        let launcher = ScriptedLauncher::new(SessionScript::rendering(listing_html(&[
            ("Kettle", 25.0),
            ("Toaster", 15.0),
        ])));
        let stats = launcher.stats();

        let outcome = session_for(fixture_site("shop"), &launcher)
            .run("electric kettle")
            .await
            .unwrap();

        assert_eq!(outcome.product_count(), 2);
        assert_eq!(stats.visited(), vec!["https://shop.test/search?q=electric+kettle"]);
        assert_eq!(stats.launched(), 1);
        assert_eq!(stats.closed(), 1);
    }

    #[tokio::test]
    async fn readiness_timeout_is_not_an_error() {
        let launcher =
            ScriptedLauncher::new(SessionScript::never_ready(listing_html(&[("A", 1.0)])));
        let stats = launcher.stats();
        let site = fixture_site_with(
            "slow",
            ReadinessPolicy::WaitForSelector {
                selector: "div.item".to_string(),
                timeout: Duration::from_millis(50),
            },
        );

        let outcome = session_for(site, &launcher).run("anything").await.unwrap();

        assert_eq!(outcome, SiteOutcome::NotReady);
        assert_eq!(stats.closed(), 1);
    }

    #[tokio::test]
    async fn selector_wait_that_never_returns_is_cut_off_at_its_bound() {
        let launcher =
            ScriptedLauncher::new(SessionScript::stuck_waiting(listing_html(&[("A", 1.0)])));
        let stats = launcher.stats();
        let bound = Duration::from_millis(50);
        let site = fixture_site_with(
            "sluggish",
            ReadinessPolicy::WaitForSelector {
                selector: "div.item".to_string(),
                timeout: bound,
            },
        );
        let session = SiteSession::new(
            Arc::new(site),
            Arc::new(launcher.clone()),
            Duration::from_secs(5),
        );

        let started = tokio::time::Instant::now();
        let outcome = session.run("anything").await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(outcome, SiteOutcome::NotReady);
        assert_eq!(stats.closed(), 1);
        assert!(elapsed >= bound, "returned before the bound: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "waited too long: {elapsed:?}");
    }

    #[tokio::test]
    async fn navigation_failure_still_releases_browser() {
        let launcher =
            ScriptedLauncher::new(SessionScript::failing_navigation("net::ERR_NAME_NOT_RESOLVED"));
        let stats = launcher.stats();

        let err = session_for(fixture_site("down"), &launcher)
            .run("anything")
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::Browser(BrowserError::Navigation { .. })));
        assert_eq!(stats.closed(), 1);
    }

    #[tokio::test]
    async fn hanging_navigation_times_out() {
        let launcher = ScriptedLauncher::new(SessionScript::hanging());
        let stats = launcher.stats();

        let err = session_for(fixture_site("stuck"), &launcher)
            .run("anything")
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::NavigationTimeout { .. }));
        assert_eq!(stats.closed(), 1);
    }

    #[tokio::test]
    async fn launch_failure_is_reported() {
        let launcher = ScriptedLauncher::new(SessionScript::failing_launch("no chromium"));
        let stats = launcher.stats();

        let err = session_for(fixture_site("shop"), &launcher)
            .run("anything")
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::Browser(BrowserError::Launch(_))));
        assert_eq!(stats.launched(), 0);
    }
}
