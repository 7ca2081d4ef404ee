//! Registered e-commerce sites
//!
//! A [`SiteProfile`] pairs a search URL template and a readiness policy with
//! the site's [`Extractor`]. Supporting another site means building one more
//! profile and registering it; the orchestrator never changes.

pub mod amazon;
pub mod flipkart;
pub mod myntra;
pub mod nykaa;
pub mod target;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::infrastructure::parsing::{Extractor, ParsingResult, SelectorExtractor, SiteSelectors};

/// Placeholder replaced by the encoded query in a search URL template
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// How a session decides the results page has rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessPolicy {
    /// Wait a fixed amount of time after navigation
    Settle(Duration),
    /// Wait until `selector` matches, for at most `timeout`
    WaitForSelector { selector: String, timeout: Duration },
}

/// One searchable site
pub struct SiteProfile {
    pub name: String,
    pub base_url: String,
    /// Search URL with a `{query}` placeholder
    pub search_url_template: String,
    /// Replacement for spaces in the query
    pub query_separator: String,
    pub readiness: ReadinessPolicy,
    pub extractor: Arc<dyn Extractor>,
}

impl fmt::Debug for SiteProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteProfile")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("search_url_template", &self.search_url_template)
            .field("readiness", &self.readiness)
            .finish_non_exhaustive()
    }
}

impl SiteProfile {
    /// Profile whose extractor is compiled from a selector description
    pub fn from_selectors(
        name: &str,
        base_url: &str,
        search_url_template: &str,
        query_separator: &str,
        readiness: ReadinessPolicy,
        selectors: &SiteSelectors,
    ) -> ParsingResult<Self> {
        let extractor = SelectorExtractor::new(name, base_url, selectors)?;
        Ok(Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            search_url_template: search_url_template.to_string(),
            query_separator: query_separator.to_string(),
            readiness,
            extractor: Arc::new(extractor),
        })
    }

    /// Substitute the query into the search URL template.
    ///
    /// Words are joined with the site's separator; characters that are not
    /// URL-safe are percent-encoded.
    pub fn search_url(&self, query: &str) -> String {
        let encoded = query
            .split_whitespace()
            .map(|word| url::form_urlencoded::byte_serialize(word.as_bytes()).collect::<String>())
            .collect::<Vec<_>>()
            .join(&self.query_separator);
        self.search_url_template.replace(QUERY_PLACEHOLDER, &encoded)
    }
}

/// The set of sites a search fans out to
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<Arc<SiteProfile>>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in site
    pub fn builtin() -> ParsingResult<Self> {
        let mut registry = Self::new();
        registry.register(amazon::profile()?);
        registry.register(flipkart::profile()?);
        registry.register(target::profile()?);
        registry.register(myntra::profile()?);
        registry.register(nykaa::profile()?);
        Ok(registry)
    }

    /// Register a site, replacing any earlier site with the same name
    pub fn register(&mut self, site: SiteProfile) {
        self.sites.retain(|existing| existing.name != site.name);
        self.sites.push(Arc::new(site));
    }

    /// Keep only the named sites. An empty list keeps everything.
    pub fn retain_enabled(mut self, enabled: &[String]) -> Self {
        if enabled.is_empty() {
            return self;
        }
        for name in enabled {
            if self.get(name).is_none() {
                warn!("Ignoring unknown site in configuration: {}", name);
            }
        }
        self.sites
            .retain(|site| enabled.iter().any(|name| name.eq_ignore_ascii_case(&site.name)));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<SiteProfile>> {
        self.sites
            .iter()
            .find(|site| site.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn sites(&self) -> &[Arc<SiteProfile>] {
        &self.sites
    }

    pub fn names(&self) -> Vec<String> {
        self.sites.iter().map(|site| site.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
