//! Test utilities for price-scout
//!
//! Provides a scripted browser so orchestrator and API tests run without a
//! real Chromium, plus small fixture sites whose markup the tests generate.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::infrastructure::browser::{BrowserError, BrowserLauncher, BrowserSession};
use crate::infrastructure::parsing::{LinkRule, SiteSelectors};
use crate::infrastructure::sites::{ReadinessPolicy, SiteProfile, SiteRegistry};

/// Behaviour of a scripted browser session
#[derive(Debug, Clone)]
pub enum SessionScript {
    /// Navigation succeeds after `delay` and the page renders `html`
    Rendering { html: String, delay: Duration },
    /// The browser never starts
    LaunchFails(String),
    /// Navigation returns an error
    NavigationFails(String),
    /// Navigation succeeds but any awaited selector never shows up
    NeverReady { html: String },
    /// Navigation succeeds but waiting for a selector never returns
    StuckWaiting { html: String },
    /// Navigation never completes
    Hangs,
    /// Reading the document panics
    Panics,
}

impl SessionScript {
    pub fn rendering(html: impl Into<String>) -> Self {
        Self::Rendering {
            html: html.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn rendering_after(html: impl Into<String>, delay: Duration) -> Self {
        Self::Rendering {
            html: html.into(),
            delay,
        }
    }

    pub fn failing_launch(reason: impl Into<String>) -> Self {
        Self::LaunchFails(reason.into())
    }

    pub fn failing_navigation(reason: impl Into<String>) -> Self {
        Self::NavigationFails(reason.into())
    }

    pub fn never_ready(html: impl Into<String>) -> Self {
        Self::NeverReady { html: html.into() }
    }

    pub fn stuck_waiting(html: impl Into<String>) -> Self {
        Self::StuckWaiting { html: html.into() }
    }

    pub fn hanging() -> Self {
        Self::Hangs
    }

    pub fn panicking() -> Self {
        Self::Panics
    }
}

/// Counters shared between a [`ScriptedLauncher`] and the test body
#[derive(Debug, Clone, Default)]
pub struct LauncherStats {
    inner: Arc<StatsInner>,
}

#[derive(Debug, Default)]
struct StatsInner {
    launched: AtomicUsize,
    closed: AtomicUsize,
    open: AtomicUsize,
    peak_open: AtomicUsize,
    visited: Mutex<Vec<String>>,
}

impl LauncherStats {
    pub fn launched(&self) -> usize {
        self.inner.launched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Most browsers that were alive at the same moment
    pub fn peak_open(&self) -> usize {
        self.inner.peak_open.load(Ordering::SeqCst)
    }

    /// URLs passed to `navigate`, in call order
    pub fn visited(&self) -> Vec<String> {
        self.inner
            .visited
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }

    /// Poll until at least `expected` browsers have closed or `timeout` passes
    pub async fn wait_for_closed(&self, expected: usize, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.closed() < expected && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn record_launch(&self) {
        self.inner.launched.fetch_add(1, Ordering::SeqCst);
        let open = self.inner.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak_open.fetch_max(open, Ordering::SeqCst);
    }

    fn record_close(&self) {
        self.inner.open.fetch_sub(1, Ordering::SeqCst);
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
    }

    fn record_visit(&self, url: &str) {
        if let Ok(mut urls) = self.inner.visited.lock() {
            urls.push(url.to_string());
        }
    }
}

/// Launcher whose sessions follow a script.
///
/// Routes pick a script by substring match on the navigated URL, so a single
/// launcher can serve a whole registry of fixture sites.
#[derive(Debug, Clone)]
pub struct ScriptedLauncher {
    default: SessionScript,
    routes: Arc<Vec<(String, SessionScript)>>,
    stats: LauncherStats,
}

impl ScriptedLauncher {
    pub fn new(default: SessionScript) -> Self {
        Self {
            default,
            routes: Arc::new(Vec::new()),
            stats: LauncherStats::default(),
        }
    }

    /// Use `script` for URLs containing `url_fragment`
    pub fn route(mut self, url_fragment: impl Into<String>, script: SessionScript) -> Self {
        Arc::make_mut(&mut self.routes).push((url_fragment.into(), script));
        self
    }

    pub fn stats(&self) -> LauncherStats {
        self.stats.clone()
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        if let SessionScript::LaunchFails(reason) = &self.default {
            return Err(BrowserError::Launch(reason.clone()));
        }
        self.stats.record_launch();
        Ok(Box::new(ScriptedSession {
            default: self.default.clone(),
            routes: Arc::clone(&self.routes),
            active: None,
            stats: self.stats.clone(),
        }))
    }
}

struct ScriptedSession {
    default: SessionScript,
    routes: Arc<Vec<(String, SessionScript)>>,
    active: Option<SessionScript>,
    stats: LauncherStats,
}

impl ScriptedSession {
    fn script_for(&self, url: &str) -> SessionScript {
        self.routes
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, script)| script.clone())
            .unwrap_or_else(|| self.default.clone())
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.stats.record_visit(url);
        let script = self.script_for(url);
        self.active = Some(script.clone());

        match script {
            SessionScript::Rendering { delay, .. } => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            SessionScript::NavigationFails(reason) | SessionScript::LaunchFails(reason) => {
                Err(BrowserError::Navigation {
                    url: url.to_string(),
                    reason,
                })
            }
            SessionScript::Hangs => futures::future::pending().await,
            SessionScript::NeverReady { .. }
            | SessionScript::StuckWaiting { .. }
            | SessionScript::Panics => Ok(()),
        }
    }

    async fn wait_for_selector(
        &mut self,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<bool, BrowserError> {
        match self.active {
            Some(SessionScript::NeverReady { .. }) => Ok(false),
            Some(SessionScript::StuckWaiting { .. }) => futures::future::pending().await,
            _ => Ok(true),
        }
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        match &self.active {
            Some(
                SessionScript::Rendering { html, .. }
                | SessionScript::NeverReady { html }
                | SessionScript::StuckWaiting { html },
            ) => Ok(html.clone()),
            Some(SessionScript::Panics) => panic!("scripted document failure"),
            _ => Err(BrowserError::Document("nothing rendered".to_string())),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.stats.record_close();
        Ok(())
    }
}

/// Selector layout used by every fixture site
pub fn fixture_selectors() -> SiteSelectors {
    SiteSelectors {
        container: "div.item".to_string(),
        title: vec!["h2".to_string()],
        price: vec!["span.price".to_string()],
        currency: None,
        default_currency: "$".to_string(),
        price_tokens: Vec::new(),
        link: LinkRule::Href {
            selector: "a".to_string(),
        },
    }
}

/// A site at `https://<name>.test` that settles instantly
pub fn fixture_site(name: &str) -> SiteProfile {
    fixture_site_with(name, ReadinessPolicy::Settle(Duration::ZERO))
}

pub fn fixture_site_with(name: &str, readiness: ReadinessPolicy) -> SiteProfile {
    let base_url = format!("https://{name}.test");
    let template = format!("{base_url}/search?q={{query}}");
    // Fixture selectors are static and known to compile
    SiteProfile::from_selectors(
        name,
        &base_url,
        &template,
        "+",
        readiness,
        &fixture_selectors(),
    )
    .unwrap_or_else(|e| panic!("fixture site {name} is invalid: {e}"))
}

/// Registry of fixture sites, in the given order
pub fn fixture_registry(names: &[&str]) -> SiteRegistry {
    let mut registry = SiteRegistry::new();
    for name in names {
        registry.register(fixture_site(name));
    }
    registry
}

/// Results page markup understood by [`fixture_selectors`]
pub fn listing_html(items: &[(&str, f64)]) -> String {
    let body: String = items
        .iter()
        .enumerate()
        .map(|(i, (title, price))| {
            format!(
                r#"<div class="item"><h2>{title}</h2><span class="price">${price}</span><a href="/p/{i}">view</a></div>"#
            )
        })
        .collect();
    format!("<html><body>{body}</body></html>")
}
