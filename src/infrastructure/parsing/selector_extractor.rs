//! Selector-driven extractor used by the built-in sites
//!
//! Compiles a [`SiteSelectors`] profile once and applies it to every
//! container of a rendered results page. A container that lacks a field or
//! carries an unparseable price is skipped on its own.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::config::{LinkRule, SiteSelectors};
use super::links::resolve_link;
use super::price::parse_price;
use super::{Extractor, ParsingError, ParsingResult};
use crate::domain::Product;

#[derive(Debug)]
enum CompiledLinkRule {
    Href(Selector),
    AnchorContaining { anchor: Selector, inner: Selector },
    None,
}

/// Extractor for sites whose listings can be described with CSS selectors
#[derive(Debug)]
pub struct SelectorExtractor {
    site: String,
    base_url: String,
    container: Selector,
    title: Vec<Selector>,
    price: Vec<Selector>,
    currency: Option<Selector>,
    default_currency: String,
    price_tokens: Vec<String>,
    link: CompiledLinkRule,
}

impl SelectorExtractor {
    /// Compile a selector profile. Fails on the first invalid selector.
    pub fn new(
        site: impl Into<String>,
        base_url: impl Into<String>,
        selectors: &SiteSelectors,
    ) -> ParsingResult<Self> {
        if selectors.title.is_empty() {
            return Err(ParsingError::required_field_missing(
                "title",
                Some("selector profile has no title selectors"),
            ));
        }
        if selectors.price.is_empty() {
            return Err(ParsingError::required_field_missing(
                "price",
                Some("selector profile has no price selectors"),
            ));
        }

        let link = match &selectors.link {
            LinkRule::Href { selector } => CompiledLinkRule::Href(compile(selector)?),
            LinkRule::AnchorContaining { selector } => CompiledLinkRule::AnchorContaining {
                anchor: compile("a")?,
                inner: compile(selector)?,
            },
            LinkRule::None => CompiledLinkRule::None,
        };

        Ok(Self {
            site: site.into(),
            base_url: base_url.into(),
            container: compile(&selectors.container)?,
            title: compile_all(&selectors.title)?,
            price: compile_all(&selectors.price)?,
            currency: selectors.currency.as_deref().map(compile).transpose()?,
            default_currency: selectors.default_currency.clone(),
            price_tokens: selectors.price_tokens.clone(),
            link,
        })
    }

    fn extract_container(&self, container: &ElementRef<'_>) -> ParsingResult<Product> {
        let title = self.extract_title(container)?;
        let price_whole = self.extract_price(container)?;
        let price_currency = self
            .currency
            .as_ref()
            .and_then(|selector| first_text(container, selector))
            .unwrap_or_else(|| self.default_currency.clone());
        let link = self
            .extract_href(container)
            .map(|href| resolve_link(href, &self.base_url))
            .unwrap_or_default();

        Ok(Product::new(title, price_currency, price_whole, link)?)
    }

    fn extract_title(&self, container: &ElementRef<'_>) -> ParsingResult<String> {
        let mut parts = Vec::with_capacity(self.title.len());
        for selector in &self.title {
            let part = first_text(container, selector).ok_or_else(|| {
                ParsingError::required_field_missing("title", Some(self.site.as_str()))
            })?;
            parts.push(part);
        }
        Ok(parts.join(" "))
    }

    fn extract_price(&self, container: &ElementRef<'_>) -> ParsingResult<f64> {
        let text = self
            .price
            .iter()
            .find_map(|selector| first_text(container, selector))
            .ok_or_else(|| {
                ParsingError::required_field_missing("price", Some(self.site.as_str()))
            })?;

        parse_price(&text, &self.price_tokens).ok_or_else(|| ParsingError::invalid_price(&text))
    }

    fn extract_href<'a>(&self, container: &ElementRef<'a>) -> Option<&'a str> {
        match &self.link {
            CompiledLinkRule::Href(selector) => container
                .select(selector)
                .next()
                .and_then(|element| element.value().attr("href")),
            CompiledLinkRule::AnchorContaining { anchor, inner } => container
                .select(anchor)
                .find(|a| a.select(inner).next().is_some())
                .and_then(|a| a.value().attr("href")),
            CompiledLinkRule::None => None,
        }
    }
}

impl Extractor for SelectorExtractor {
    fn extract(&self, document: &Html) -> Vec<Product> {
        let mut products = Vec::new();
        let mut skipped = 0usize;

        for (index, container) in document.select(&self.container).enumerate() {
            match self.extract_container(&container) {
                Ok(product) => products.push(product),
                Err(e) => {
                    skipped += 1;
                    debug!("[{}] skipping container {}: {}", self.site, index, e);
                }
            }
        }

        debug!(
            "[{}] extracted {} products ({} containers skipped)",
            self.site,
            products.len(),
            skipped
        );
        products
    }
}

fn compile(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

fn compile_all(selectors: &[String]) -> ParsingResult<Vec<Selector>> {
    selectors.iter().map(|s| compile(s)).collect()
}

/// Whitespace-normalized text of the first match, if it has any text
fn first_text(container: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    container
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
}
