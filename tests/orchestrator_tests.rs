//! End-to-end search behaviour with scripted browsers
use std::sync::Arc;
use std::time::Duration;

use price_scout::crawling::{OrchestratorConfig, SearchOrchestrator};
use price_scout::domain::{OutcomeKind, Product};
use price_scout::infrastructure::config::ScrapingConfig;
use price_scout::infrastructure::sites::{ReadinessPolicy, SiteRegistry};
use price_scout::test_utils::{
    fixture_registry, fixture_site, fixture_site_with, listing_html, ScriptedLauncher,
    SessionScript,
};

fn searcher(
    registry: SiteRegistry,
    launcher: &ScriptedLauncher,
    config: OrchestratorConfig,
) -> SearchOrchestrator {
    SearchOrchestrator::new(Arc::new(registry), Arc::new(launcher.clone()), config)
}

#[tokio::test]
async fn mixed_outcomes_merge_only_successful_sites() {
    let cheap = listing_html(&[("Mug", 4.5), ("Plate", 12.0)]);
    let pricey = listing_html(&[("Teapot", 40.0), ("Cup", 4.5)]);
    let launcher = ScriptedLauncher::new(SessionScript::failing_navigation("connection refused"))
        .route("cheap.test", SessionScript::rendering(cheap))
        .route(
            "pricey.test",
            SessionScript::rendering_after(pricey, Duration::from_millis(30)),
        )
        .route("crashy.test", SessionScript::panicking());
    let stats = launcher.stats();

    let registry = fixture_registry(&["cheap", "pricey", "broken", "crashy"]);
    let report = searcher(registry, &launcher, OrchestratorConfig::default())
        .search("tea set")
        .await;

    let prices: Vec<f64> = report.products.iter().map(Product::price_whole).collect();
    assert_eq!(prices, vec![4.5, 4.5, 12.0, 40.0]);
    assert!(report.products.iter().all(|p| !p.title().is_empty() && p.price_whole() > 0.0));
    // Equal prices keep completion order: "cheap" finishes before the delayed "pricey"
    assert_eq!(report.products[0].title(), "Mug");
    assert_eq!(report.products[1].title(), "Cup");

    let outcome_of = |site: &str| report.sites.iter().find(|s| s.site == site).unwrap().outcome;
    assert_eq!(outcome_of("cheap"), OutcomeKind::Completed);
    assert_eq!(outcome_of("pricey"), OutcomeKind::Completed);
    assert_eq!(outcome_of("broken"), OutcomeKind::Failed);
    assert_eq!(outcome_of("crashy"), OutcomeKind::Failed);

    stats.wait_for_closed(4, Duration::from_secs(1)).await;
    assert_eq!(stats.launched(), 4);
    assert_eq!(stats.closed(), 4);
}

#[tokio::test]
async fn not_ready_site_contributes_nothing() {
    let launcher = ScriptedLauncher::new(SessionScript::rendering(listing_html(&[("Lamp", 30.0)])))
        .route("lazy.test", SessionScript::never_ready(listing_html(&[("Hidden", 1.0)])));

    let mut registry = SiteRegistry::new();
    registry.register(fixture_site("quick"));
    registry.register(fixture_site_with(
        "lazy",
        ReadinessPolicy::WaitForSelector {
            selector: "div.item".to_string(),
            timeout: Duration::from_millis(100),
        },
    ));

    let report = searcher(registry, &launcher, OrchestratorConfig::default())
        .search("lamp")
        .await;

    assert_eq!(report.products.len(), 1);
    assert_eq!(report.products[0].title(), "Lamp");
    let lazy = report.sites.iter().find(|s| s.site == "lazy").unwrap();
    assert_eq!(lazy.outcome, OutcomeKind::NotReady);
    assert!(!report.all_failed());
}

#[tokio::test]
async fn all_sites_failing_is_an_empty_success() {
    let launcher = ScriptedLauncher::new(SessionScript::failing_launch("chromium not installed"));

    let products = searcher(fixture_registry(&["a", "b"]), &launcher, OrchestratorConfig::default())
        .search_all("anything")
        .await;

    assert!(products.is_empty());
}

#[tokio::test]
async fn scraping_config_drives_the_orchestrator() {
    let scraping = ScrapingConfig {
        max_concurrent_jobs: 1,
        global_timeout_seconds: 0,
        navigation_timeout_seconds: 2,
        ..ScrapingConfig::default()
    };
    let config = OrchestratorConfig::from(&scraping);
    assert_eq!(config.global_timeout, None);
    assert_eq!(config.navigation_timeout, Duration::from_secs(2));

    let launcher = ScriptedLauncher::new(SessionScript::rendering_after(
        listing_html(&[("Item", 9.99)]),
        Duration::from_millis(10),
    ));
    let stats = launcher.stats();

    let products = searcher(fixture_registry(&["a", "b", "c"]), &launcher, config)
        .search_all("item")
        .await;

    assert_eq!(products.len(), 3);
    assert_eq!(stats.peak_open(), 1);
}

#[tokio::test]
async fn query_words_are_joined_with_the_site_separator() {
    let launcher = ScriptedLauncher::new(SessionScript::rendering(listing_html(&[])));
    let stats = launcher.stats();

    searcher(fixture_registry(&["shop"]), &launcher, OrchestratorConfig::default())
        .search_all("iphone 16 pro max")
        .await;

    assert_eq!(stats.visited(), vec!["https://shop.test/search?q=iphone+16+pro+max"]);
}
