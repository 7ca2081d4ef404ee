use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reasons a scraped record cannot become a `Product`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProductError {
    #[error("Product title is empty")]
    EmptyTitle,

    #[error("Product price must be a positive number, got {0}")]
    InvalidPrice(f64),
}

/// One product listing found on a site's search results page.
///
/// Fields are private so a `Product` can only be built through [`Product::new`],
/// which guarantees a non-empty title and a strictly positive, finite price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ProductRecord")]
pub struct Product {
    title: String,
    price_currency: String,
    price_whole: f64,
    link: String,
}

impl Product {
    /// Build a validated product. The title is trimmed before validation.
    pub fn new(
        title: impl Into<String>,
        price_currency: impl Into<String>,
        price_whole: f64,
        link: impl Into<String>,
    ) -> Result<Self, ProductError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(ProductError::EmptyTitle);
        }
        if !price_whole.is_finite() || price_whole <= 0.0 {
            return Err(ProductError::InvalidPrice(price_whole));
        }

        Ok(Self {
            title,
            price_currency: price_currency.into().trim().to_string(),
            price_whole,
            link: link.into(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price_currency(&self) -> &str {
        &self.price_currency
    }

    pub fn price_whole(&self) -> f64 {
        self.price_whole
    }

    /// Absolute product URL, or an empty string when the listing had none
    pub fn link(&self) -> &str {
        &self.link
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}{} - {}",
            self.title, self.price_currency, self.price_whole, self.link
        )
    }
}

/// Unvalidated wire shape; deserialization re-runs the `Product` invariants.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRecord {
    title: String,
    price_currency: String,
    price_whole: f64,
    #[serde(default)]
    link: String,
}

impl TryFrom<ProductRecord> for Product {
    type Error = ProductError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.title,
            record.price_currency,
            record.price_whole,
            record.link,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_title() {
        assert_eq!(
            Product::new("   ", "₹", 10.0, ""),
            Err(ProductError::EmptyTitle)
        );
    }

    #[test]
    fn rejects_non_positive_and_non_finite_prices() {
        assert!(matches!(
            Product::new("Phone", "₹", 0.0, ""),
            Err(ProductError::InvalidPrice(_))
        ));
        assert!(Product::new("Phone", "₹", -3.5, "").is_err());
        assert!(Product::new("Phone", "₹", f64::NAN, "").is_err());
        assert!(Product::new("Phone", "₹", f64::INFINITY, "").is_err());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let product = Product::new("Lipstick", "₹", 499.0, "https://www.nykaa.com/p/1").unwrap();
        let json = serde_json::to_value(&product).unwrap();

        assert_eq!(json["title"], "Lipstick");
        assert_eq!(json["priceCurrency"], "₹");
        assert_eq!(json["priceWhole"], 499.0);
        assert_eq!(json["link"], "https://www.nykaa.com/p/1");
    }

    #[test]
    fn deserialization_enforces_invariants() {
        let bad = serde_json::json!({
            "title": "Phone",
            "priceCurrency": "$",
            "priceWhole": 0.0,
            "link": ""
        });
        assert!(serde_json::from_value::<Product>(bad).is_err());
    }

    #[test]
    fn display_matches_listing_format() {
        let product = Product::new("Shirt", "Rs.", 799.0, "https://www.myntra.com/1").unwrap();
        assert_eq!(product.to_string(), "Shirt - Rs.799 - https://www.myntra.com/1");
    }
}
