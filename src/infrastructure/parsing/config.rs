//! Selector configuration for search result extraction
//!
//! Centralized description of where a site keeps each product field.

use serde::{Deserialize, Serialize};

/// CSS selectors describing one site's search result markup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSelectors {
    /// Selector for the node wrapping a single product listing
    pub container: String,

    /// Title parts, each looked up inside the container and joined by a space.
    /// Every part is required.
    pub title: Vec<String>,

    /// Price selectors tried in order; the first one present wins
    pub price: Vec<String>,

    /// Optional selector for a currency symbol shown next to the price
    pub currency: Option<String>,

    /// Currency used when `currency` is unset or finds nothing
    pub default_currency: String,

    /// Site-specific tokens stripped from price text besides the common symbols
    #[serde(default)]
    pub price_tokens: Vec<String>,

    /// How the product link is located
    pub link: LinkRule,
}

/// Strategy for locating a listing's product link inside its container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkRule {
    /// `href` of the first element matching `selector`
    Href { selector: String },
    /// `href` of the first `<a>` whose subtree contains a `selector` match
    AnchorContaining { selector: String },
    /// The site exposes no usable link
    None,
}

impl SiteSelectors {
    /// Every selector string in this profile, for up-front validation
    pub fn all_selectors(&self) -> Vec<&str> {
        let mut selectors = vec![self.container.as_str()];
        selectors.extend(self.title.iter().map(String::as_str));
        selectors.extend(self.price.iter().map(String::as_str));
        if let Some(currency) = &self.currency {
            selectors.push(currency);
        }
        match &self.link {
            LinkRule::Href { selector } | LinkRule::AnchorContaining { selector } => {
                selectors.push(selector);
            }
            LinkRule::None => {}
        }
        selectors
    }
}
