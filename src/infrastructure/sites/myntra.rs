//! myntra.com search results

use std::time::Duration;

use crate::infrastructure::parsing::{LinkRule, ParsingResult, SiteSelectors};
use crate::infrastructure::sites::{ReadinessPolicy, SiteProfile};

pub const NAME: &str = "myntra";
pub const BASE_URL: &str = "https://www.myntra.com/";

const CONTAINER: &str = "li.product-base";
const READY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn selectors() -> SiteSelectors {
    SiteSelectors {
        container: CONTAINER.to_string(),
        title: vec!["h3.product-brand".to_string(), "h4.product-product".to_string()],
        // Discounted price first, list price otherwise
        price: vec![
            "span.product-discountedPrice".to_string(),
            "div.product-price".to_string(),
        ],
        currency: None,
        default_currency: "Rs.".to_string(),
        price_tokens: Vec::new(),
        link: LinkRule::Href {
            selector: "a".to_string(),
        },
    }
}

pub fn profile() -> ParsingResult<SiteProfile> {
    SiteProfile::from_selectors(
        NAME,
        BASE_URL,
        "https://www.myntra.com/{query}",
        "-",
        ReadinessPolicy::WaitForSelector {
            selector: CONTAINER.to_string(),
            timeout: READY_TIMEOUT,
        },
        &selectors(),
    )
}
