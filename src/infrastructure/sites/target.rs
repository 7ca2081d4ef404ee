//! target.com search results
//!
//! Target renders listings client side, so the session waits for the
//! listing container instead of a fixed delay.

use std::time::Duration;

use crate::infrastructure::parsing::{LinkRule, ParsingResult, SiteSelectors};
use crate::infrastructure::sites::{ReadinessPolicy, SiteProfile};

pub const NAME: &str = "target";
pub const BASE_URL: &str = "https://www.target.com";

const CONTAINER: &str = "div.sc-3f9295af-7.bnHeCs";
const READY_TIMEOUT: Duration = Duration::from_secs(20);

pub fn selectors() -> SiteSelectors {
    SiteSelectors {
        container: CONTAINER.to_string(),
        title: vec!["a[data-test='product-title']".to_string()],
        price: vec!["span[data-test='current-price']".to_string()],
        currency: None,
        default_currency: "$".to_string(),
        price_tokens: Vec::new(),
        link: LinkRule::Href {
            selector: "a[data-test='product-title']".to_string(),
        },
    }
}

pub fn profile() -> ParsingResult<SiteProfile> {
    SiteProfile::from_selectors(
        NAME,
        BASE_URL,
        "https://www.target.com/s?searchTerm={query}",
        "+",
        ReadinessPolicy::WaitForSelector {
            selector: CONTAINER.to_string(),
            timeout: READY_TIMEOUT,
        },
        &selectors(),
    )
}
