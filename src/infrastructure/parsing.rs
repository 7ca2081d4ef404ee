//! HTML extraction of product records from rendered search result pages
//!
//! An [`Extractor`] turns one rendered document into products. The built-in
//! sites use [`SelectorExtractor`], driven by a declarative [`SiteSelectors`]
//! profile, but any site can plug in its own implementation.

pub mod config;
pub mod error;
pub mod links;
pub mod price;
pub mod selector_extractor;

pub use config::{LinkRule, SiteSelectors};
pub use error::{ParsingError, ParsingResult};
pub use links::resolve_link;
pub use price::{normalize_price_text, parse_price};
pub use selector_extractor::SelectorExtractor;

use scraper::Html;

use crate::domain::Product;

/// Site-specific conversion of a rendered document into product records.
///
/// Implementations must skip containers they cannot read instead of failing
/// the whole document, and must only emit valid products.
pub trait Extractor: Send + Sync {
    fn extract(&self, document: &Html) -> Vec<Product>;

    /// Parse raw rendered HTML and extract from it
    fn extract_html(&self, html: &str) -> Vec<Product> {
        let document = Html::parse_document(html);
        self.extract(&document)
    }
}
