//! nykaa.com search results

use std::time::Duration;

use crate::infrastructure::config::defaults::SETTLE_DELAY_SECONDS;
use crate::infrastructure::parsing::{LinkRule, ParsingResult, SiteSelectors};
use crate::infrastructure::sites::{ReadinessPolicy, SiteProfile};

pub const NAME: &str = "nykaa";
pub const BASE_URL: &str = "https://www.nykaa.com";

pub fn selectors() -> SiteSelectors {
    SiteSelectors {
        container: "div.css-ifdzs8".to_string(),
        title: vec!["div.css-xrzmfa".to_string()],
        // Final price, not the struck-through MRP
        price: vec!["span.css-111z9ua".to_string()],
        currency: None,
        default_currency: "₹".to_string(),
        price_tokens: Vec::new(),
        link: LinkRule::Href {
            selector: "a.css-qlopj4".to_string(),
        },
    }
}

pub fn profile() -> ParsingResult<SiteProfile> {
    SiteProfile::from_selectors(
        NAME,
        BASE_URL,
        "https://www.nykaa.com/search/result/?q={query}",
        "+",
        ReadinessPolicy::Settle(Duration::from_secs(SETTLE_DELAY_SECONDS)),
        &selectors(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_final_price() {
        let html = r#"
            <div class="css-ifdzs8">
              <a class="css-qlopj4" href="/maybelline-lipstick/p/1234">
                <div class="css-xrzmfa">Maybelline Super Stay Matte Ink</div>
              </a>
              <span class="css-17x46n5"><span>₹799</span></span>
              <span class="css-111z9ua">₹559</span>
            </div>
        "#;

        let products = profile().unwrap().extractor.extract_html(html);

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price_whole(), 559.0);
        assert_eq!(products[0].link(), "https://www.nykaa.com/maybelline-lipstick/p/1234");
    }
}
