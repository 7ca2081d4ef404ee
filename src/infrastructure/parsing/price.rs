//! Price text normalization

/// Currency markers removed from every site's price text
const COMMON_CURRENCY_TOKENS: &[&str] = &["Rs.", "₹", "$", "€", "£"];

/// Strip currency markers, thousands separators and surrounding whitespace.
pub fn normalize_price_text(raw: &str, extra_tokens: &[String]) -> String {
    let mut text = raw.to_string();
    for token in extra_tokens {
        if !token.is_empty() {
            text = text.replace(token.as_str(), "");
        }
    }
    for token in COMMON_CURRENCY_TOKENS {
        text = text.replace(token, "");
    }
    text.replace(',', "").trim().to_string()
}

/// Parse listing price text into a positive amount.
///
/// Returns `None` for anything that does not parse, is not finite, or is not
/// strictly greater than zero ("Out of Stock", "0", price ranges).
pub fn parse_price(raw: &str, extra_tokens: &[String]) -> Option<f64> {
    let normalized = normalize_price_text(raw, extra_tokens);
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}
