//! # Search Orchestrator
//!
//! Fans a query out to one scrape job per registered site, collects results
//! in completion order and merges them by ascending price. Concurrency is
//! bounded by a semaphore; an optional global deadline cancels stragglers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::job::ScrapeJob;
use crate::domain::{merge_by_price, Product, SearchReport, SiteOutcome, SiteReport};
use crate::infrastructure::browser::BrowserLauncher;
use crate::infrastructure::config::{defaults, ScrapingConfig};
use crate::infrastructure::sites::SiteRegistry;

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum jobs running at once; 0 runs every site at once
    pub max_concurrent_jobs: usize,

    /// Deadline for the whole search
    pub global_timeout: Option<Duration>,

    /// Bound on each job's page navigation
    pub navigation_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: defaults::MAX_CONCURRENT_JOBS,
            global_timeout: Some(Duration::from_secs(defaults::GLOBAL_TIMEOUT_SECONDS)),
            navigation_timeout: Duration::from_secs(defaults::NAVIGATION_TIMEOUT_SECONDS),
        }
    }
}

impl From<&ScrapingConfig> for OrchestratorConfig {
    fn from(config: &ScrapingConfig) -> Self {
        Self {
            max_concurrent_jobs: config.max_concurrent_jobs,
            global_timeout: config.global_timeout(),
            navigation_timeout: config.navigation_timeout(),
        }
    }
}

/// What a finished job hands back to the collection loop
struct JobResult {
    site: String,
    outcome: SiteOutcome,
    elapsed: Duration,
}

/// Runs searches across every site in the registry
pub struct SearchOrchestrator {
    registry: Arc<SiteRegistry>,
    launcher: Arc<dyn BrowserLauncher>,
    config: OrchestratorConfig,
}

impl SearchOrchestrator {
    pub fn new(
        registry: Arc<SiteRegistry>,
        launcher: Arc<dyn BrowserLauncher>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            launcher,
            config,
        }
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Products from every site, sorted by ascending price.
    ///
    /// Failed sites contribute nothing; if every site fails the list is empty.
    pub async fn search_all(&self, query: &str) -> Vec<Product> {
        self.search(query).await.products
    }

    /// Search every site and report what happened on each
    pub async fn search(&self, query: &str) -> SearchReport {
        let search_id = Uuid::new_v4();
        let span = info_span!("search", id = %search_id);
        self.run_search(query).instrument(span).await
    }

    async fn run_search(&self, query: &str) -> SearchReport {
        let started = Instant::now();
        let sites = self.registry.sites();
        info!("Searching {} sites for {:?}", sites.len(), query);

        if sites.is_empty() {
            warn!("No sites registered, returning no products");
            return SearchReport {
                query: query.to_string(),
                products: Vec::new(),
                sites: Vec::new(),
            };
        }

        let permits = match self.config.max_concurrent_jobs {
            0 => sites.len(),
            limit => limit,
        };
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut jobs = JoinSet::new();
        let mut collector = Collector::new(sites.len(), started);

        for site in sites {
            let job = ScrapeJob::new(
                Arc::clone(site),
                Arc::clone(&self.launcher),
                self.config.navigation_timeout,
            );
            let semaphore = Arc::clone(&semaphore);
            let query = query.to_string();

            let handle = jobs.spawn(
                async move {
                    // Never closed
                    let _permit = semaphore.acquire_owned().await.ok();
                    let job_started = Instant::now();
                    let outcome = job.run(&query).await;
                    JobResult {
                        site: job.site_name().to_string(),
                        outcome,
                        elapsed: job_started.elapsed(),
                    }
                }
                .in_current_span(),
            );
            collector.track(handle.id(), site.name.clone());
        }

        let deadline_hit = match self.config.global_timeout {
            Some(limit) => timeout(limit, collector.drain(&mut jobs)).await.is_err(),
            None => {
                collector.drain(&mut jobs).await;
                false
            }
        };

        if deadline_hit {
            let outstanding = collector.outstanding();
            warn!(
                "Search deadline reached, cancelling {} unfinished sites: {:?}",
                outstanding.len(),
                outstanding
            );

            // Jobs that finish while the abort lands are still kept
            jobs.abort_all();
            collector.drain(&mut jobs).await;
        }

        let (results, reports) = collector.finish();
        let products = merge_by_price(results);
        info!(
            "Search finished in {:?}: {} products from {} sites",
            started.elapsed(),
            products.len(),
            reports.iter().filter(|r| r.product_count > 0).count()
        );

        SearchReport {
            query: query.to_string(),
            products,
            sites: reports,
        }
    }
}

/// Gathers finished jobs into per-site reports.
///
/// Every spawned job is tracked by task id, so a task that was aborted or
/// died outside the job's own panic isolation is still reported under its
/// site name.
struct Collector {
    running: HashMap<Id, String>,
    results: Vec<Vec<Product>>,
    reports: Vec<SiteReport>,
    started: Instant,
}

impl Collector {
    fn new(capacity: usize, started: Instant) -> Self {
        Self {
            running: HashMap::with_capacity(capacity),
            results: Vec::with_capacity(capacity),
            reports: Vec::with_capacity(capacity),
            started,
        }
    }

    fn track(&mut self, id: Id, site: String) {
        self.running.insert(id, site);
    }

    /// Sites whose jobs have not been collected yet
    fn outstanding(&self) -> Vec<String> {
        let mut sites: Vec<String> = self.running.values().cloned().collect();
        sites.sort();
        sites
    }

    /// Drain finished jobs in completion order
    async fn drain(&mut self, jobs: &mut JoinSet<JobResult>) {
        while let Some(joined) = jobs.join_next_with_id().await {
            self.record(joined);
        }
    }

    fn record(&mut self, joined: Result<(Id, JobResult), JoinError>) {
        match joined {
            Ok((
                id,
                JobResult {
                    site,
                    outcome,
                    elapsed,
                },
            )) => {
                self.running.remove(&id);
                debug!("{} finished in {:?} ({:?})", site, elapsed, outcome.kind());
                self.reports
                    .push(SiteReport::from_outcome(site, &outcome, elapsed));
                self.results.push(outcome.into_products());
            }
            Err(e) => {
                let elapsed = self.started.elapsed();
                let Some(site) = self.running.remove(&e.id()) else {
                    warn!("Untracked scrape task ended abnormally: {}", e);
                    return;
                };
                if e.is_cancelled() {
                    debug!("{} cancelled after {:?}", site, elapsed);
                    self.reports.push(SiteReport::cancelled(site, elapsed));
                } else {
                    warn!("Scrape task for {} ended abnormally: {}", site, e);
                    let outcome = SiteOutcome::Failed(e.to_string());
                    self.reports
                        .push(SiteReport::from_outcome(site, &outcome, elapsed));
                }
            }
        }
    }

    fn finish(self) -> (Vec<Vec<Product>>, Vec<SiteReport>) {
        (self.results, self.reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OutcomeKind;
    use crate::test_utils::{fixture_registry, listing_html, ScriptedLauncher, SessionScript};

    fn orchestrator(
        names: &[&str],
        launcher: &ScriptedLauncher,
        config: OrchestratorConfig,
    ) -> SearchOrchestrator {
        SearchOrchestrator::new(
            Arc::new(fixture_registry(names)),
            Arc::new(launcher.clone()),
            config,
        )
    }

    #[tokio::test]
    async fn merges_sites_by_ascending_price() {
        let alpha = listing_html(&[("A10", 10.0), ("A30", 30.0)]);
        let beta = listing_html(&[("B5", 5.0), ("B20", 20.0)]);
        let launcher = ScriptedLauncher::new(SessionScript::rendering(listing_html(&[])))
            .route("alpha.test", SessionScript::rendering(alpha))
            .route("beta.test", SessionScript::rendering(beta));

        let products =
            orchestrator(&["alpha", "beta"], &launcher, OrchestratorConfig::default())
                .search_all("kettle")
                .await;

        let prices: Vec<f64> = products.iter().map(Product::price_whole).collect();
        assert_eq!(prices, vec![5.0, 10.0, 20.0, 30.0]);
    }

    #[tokio::test]
    async fn every_site_failing_yields_empty_list() {
        let launcher = ScriptedLauncher::new(SessionScript::failing_navigation("offline"));
        let stats = launcher.stats();

        let report = orchestrator(&["a", "b", "c"], &launcher, OrchestratorConfig::default())
            .search("kettle")
            .await;

        assert!(report.products.is_empty());
        assert!(report.all_failed());
        assert_eq!(report.sites.len(), 3);
        assert_eq!(stats.closed(), 3);
    }

    #[tokio::test]
    async fn concurrency_is_bounded_by_configuration() {
        let launcher = ScriptedLauncher::new(SessionScript::rendering_after(
            listing_html(&[("X", 1.0)]),
            Duration::from_millis(50),
        ));
        let stats = launcher.stats();
        let config = OrchestratorConfig {
            max_concurrent_jobs: 2,
            ..OrchestratorConfig::default()
        };

        let products = orchestrator(&["a", "b", "c", "d", "e"], &launcher, config)
            .search_all("kettle")
            .await;

        assert_eq!(products.len(), 5);
        assert!(stats.peak_open() <= 2);
        assert_eq!(stats.closed(), 5);
    }

    #[tokio::test]
    async fn deadline_keeps_finished_sites_and_closes_the_rest() {
        let launcher = ScriptedLauncher::new(SessionScript::hanging())
            .route("fast.test", SessionScript::rendering(listing_html(&[("Quick", 3.0)])));
        let stats = launcher.stats();
        let config = OrchestratorConfig {
            max_concurrent_jobs: 0,
            global_timeout: Some(Duration::from_millis(200)),
            navigation_timeout: Duration::from_secs(30),
        };

        let report = orchestrator(&["fast", "slow"], &launcher, config)
            .search("kettle")
            .await;

        assert_eq!(report.products.len(), 1);
        assert_eq!(report.products[0].title(), "Quick");
        let slow = report.sites.iter().find(|s| s.site == "slow").unwrap();
        assert_eq!(slow.outcome, OutcomeKind::Cancelled);

        stats.wait_for_closed(2, Duration::from_secs(1)).await;
        assert_eq!(stats.closed(), 2);
    }

    #[tokio::test]
    async fn deadline_reports_each_site_once() {
        let launcher = ScriptedLauncher::new(SessionScript::hanging())
            .route("fast.test", SessionScript::rendering(listing_html(&[("Quick", 3.0)])));
        let config = OrchestratorConfig {
            max_concurrent_jobs: 0,
            global_timeout: Some(Duration::from_millis(150)),
            navigation_timeout: Duration::from_secs(30),
        };

        let report = orchestrator(&["fast", "slow", "stalled"], &launcher, config)
            .search("kettle")
            .await;

        let mut sites: Vec<&str> = report.sites.iter().map(|s| s.site.as_str()).collect();
        sites.sort_unstable();
        assert_eq!(sites, vec!["fast", "slow", "stalled"]);
        let cancelled = report
            .sites
            .iter()
            .filter(|s| s.outcome == OutcomeKind::Cancelled)
            .count();
        assert_eq!(cancelled, 2);
    }

    #[tokio::test]
    async fn task_that_dies_is_reported_as_failed_site() {
        let mut jobs: JoinSet<JobResult> = JoinSet::new();
        let mut collector = Collector::new(2, Instant::now());

        let healthy = jobs.spawn(async {
            JobResult {
                site: "healthy".to_string(),
                outcome: SiteOutcome::Completed(Vec::new()),
                elapsed: Duration::from_millis(1),
            }
        });
        collector.track(healthy.id(), "healthy".to_string());
        let broken = jobs.spawn(async { panic!("task died") });
        collector.track(broken.id(), "broken".to_string());

        collector.drain(&mut jobs).await;
        assert!(collector.outstanding().is_empty());
        let (_, reports) = collector.finish();

        assert_eq!(reports.len(), 2);
        let broken = reports.iter().find(|r| r.site == "broken").unwrap();
        assert_eq!(broken.outcome, OutcomeKind::Failed);
        assert!(broken.error.as_deref().unwrap_or_default().contains("panic"));
    }

    #[tokio::test]
    async fn empty_registry_returns_nothing() {
        let launcher = ScriptedLauncher::new(SessionScript::rendering(listing_html(&[])));

        let report = orchestrator(&[], &launcher, OrchestratorConfig::default())
            .search("kettle")
            .await;

        assert!(report.products.is_empty());
        assert!(report.sites.is_empty());
    }
}
