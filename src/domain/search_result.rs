//! Per-site outcomes and the price-ordered merge of all sites' products

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::product::Product;

/// Tagged result of one site's scrape job.
///
/// `search_all` flattens every variant into a plain product list; the tag is
/// kept for logging and for [`SearchReport`].
#[derive(Debug, Clone, PartialEq)]
pub enum SiteOutcome {
    /// The page rendered and the extractor ran (possibly finding nothing)
    Completed(Vec<Product>),
    /// The readiness wait ran out before the results appeared
    NotReady,
    /// The job failed: browser launch, navigation, document read or a crash
    Failed(String),
}

impl SiteOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Completed(_) => OutcomeKind::Completed,
            Self::NotReady => OutcomeKind::NotReady,
            Self::Failed(_) => OutcomeKind::Failed,
        }
    }

    pub fn product_count(&self) -> usize {
        match self {
            Self::Completed(products) => products.len(),
            Self::NotReady | Self::Failed(_) => 0,
        }
    }

    pub fn into_products(self) -> Vec<Product> {
        match self {
            Self::Completed(products) => products,
            Self::NotReady | Self::Failed(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Completed,
    NotReady,
    Failed,
    /// The orchestration deadline elapsed before the job finished
    Cancelled,
}

/// Summary of one site's contribution to a search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteReport {
    pub site: String,
    pub outcome: OutcomeKind,
    pub product_count: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SiteReport {
    pub fn from_outcome(site: impl Into<String>, outcome: &SiteOutcome, elapsed: Duration) -> Self {
        Self {
            site: site.into(),
            outcome: outcome.kind(),
            product_count: outcome.product_count(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            error: match outcome {
                SiteOutcome::Failed(reason) => Some(reason.clone()),
                _ => None,
            },
        }
    }

    pub fn cancelled(site: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            site: site.into(),
            outcome: OutcomeKind::Cancelled,
            product_count: 0,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            error: None,
        }
    }
}

/// Merged products of a search plus what happened on each site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub query: String,
    pub products: Vec<Product>,
    pub sites: Vec<SiteReport>,
}

impl SearchReport {
    /// True when no site completed; an empty product list then means failure
    /// rather than "no matches"
    pub fn all_failed(&self) -> bool {
        !self.sites.is_empty()
            && self
                .sites
                .iter()
                .all(|s| s.outcome != OutcomeKind::Completed)
    }
}

/// Concatenate per-site product lists and order them by ascending price.
///
/// The sort is stable: products with equal prices keep their concatenation
/// order, so ties follow the order in which the lists are supplied.
pub fn merge_by_price<I>(results: I) -> Vec<Product>
where
    I: IntoIterator<Item = Vec<Product>>,
{
    let mut merged: Vec<Product> = results.into_iter().flatten().collect();
    merged.sort_by(|a, b| a.price_whole().total_cmp(&b.price_whole()));
    merged
}
