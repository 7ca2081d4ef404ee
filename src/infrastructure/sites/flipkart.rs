//! flipkart.com search results

use std::time::Duration;

use crate::infrastructure::config::defaults::SETTLE_DELAY_SECONDS;
use crate::infrastructure::parsing::{LinkRule, ParsingResult, SiteSelectors};
use crate::infrastructure::sites::{ReadinessPolicy, SiteProfile};

pub const NAME: &str = "flipkart";
pub const BASE_URL: &str = "https://www.flipkart.com";

pub fn selectors() -> SiteSelectors {
    SiteSelectors {
        container: "div.yKfJKb.row".to_string(),
        title: vec!["div.KzDlHZ".to_string()],
        price: vec!["div.Nx9bqj._4b5DiR".to_string()],
        currency: None,
        default_currency: "₹".to_string(),
        price_tokens: Vec::new(),
        // The title sits inside the product anchor
        link: LinkRule::AnchorContaining {
            selector: "div.KzDlHZ".to_string(),
        },
    }
}

pub fn profile() -> ParsingResult<SiteProfile> {
    SiteProfile::from_selectors(
        NAME,
        BASE_URL,
        "https://www.flipkart.com/search?q={query}",
        "+",
        ReadinessPolicy::Settle(Duration::from_secs(SETTLE_DELAY_SECONDS)),
        &selectors(),
    )
}
