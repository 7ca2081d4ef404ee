//! amazon.in search results

use std::time::Duration;

use crate::infrastructure::config::defaults::SETTLE_DELAY_SECONDS;
use crate::infrastructure::parsing::{LinkRule, ParsingResult, SiteSelectors};
use crate::infrastructure::sites::{ReadinessPolicy, SiteProfile};

pub const NAME: &str = "amazon";
pub const BASE_URL: &str = "https://www.amazon.in";

pub fn selectors() -> SiteSelectors {
    SiteSelectors {
        container: "div.s-result-item".to_string(),
        title: vec!["h2.a-size-medium.a-text-normal span".to_string()],
        price: vec!["span.a-price-whole".to_string()],
        currency: Some("span.a-price-symbol".to_string()),
        default_currency: "₹".to_string(),
        price_tokens: Vec::new(),
        link: LinkRule::Href {
            selector: "a.a-link-normal.a-text-normal".to_string(),
        },
    }
}

pub fn profile() -> ParsingResult<SiteProfile> {
    SiteProfile::from_selectors(
        NAME,
        BASE_URL,
        "https://www.amazon.in/s?k={query}",
        "+",
        ReadinessPolicy::Settle(Duration::from_secs(SETTLE_DELAY_SECONDS)),
        &selectors(),
    )
}
