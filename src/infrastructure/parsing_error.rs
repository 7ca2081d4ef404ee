//! Parsing error types for per-container product extraction
//!
//! Every variant describes why a single container was skipped; none of them
//! aborts the extraction of the remaining containers.

use thiserror::Error;

use crate::domain::ProductError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("Required field '{field}' not found in container")]
    RequiredFieldMissing {
        field: String,
        context: Option<String>,
    },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Unparseable price text: {text:?}")]
    InvalidPrice { text: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed {
        url: String,
        reason: String,
        base_url: Option<String>,
    },

    #[error("Product validation failed: {0}")]
    InvalidProduct(#[from] ProductError),
}

impl ParsingError {
    pub fn required_field_missing(field: &str, context: Option<&str>) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            context: context.map(ToString::to_string),
        }
    }

    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_price(text: &str) -> Self {
        Self::InvalidPrice {
            text: text.to_string(),
        }
    }

    /// Configuration mistakes, as opposed to a malformed listing
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::InvalidSelector { .. })
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
