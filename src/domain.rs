//! Domain module - Core product model and search results
//!
//! - `product`: the validated `Product` value type
//! - `search_result`: per-site outcomes, the merged search report and the
//!   price-ordered merge

pub mod product;
pub mod search_result;

pub use product::{Product, ProductError};
pub use search_result::{merge_by_price, OutcomeKind, SearchReport, SiteOutcome, SiteReport};
