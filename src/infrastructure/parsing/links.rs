//! Product link resolution

use tracing::debug;
use url::Url;

use super::{ParsingError, ParsingResult};

/// Resolve a listing link against the site's base URL.
///
/// Absolute links are returned unchanged, relative ones are joined onto
/// `base_url`. An empty or unresolvable link yields an empty string.
pub fn resolve_link(href: &str, base_url: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }

    match try_resolve_link(href, base_url) {
        Ok(link) => link,
        Err(e) => {
            debug!("Dropping product link: {}", e);
            String::new()
        }
    }
}

fn try_resolve_link(href: &str, base_url: &str) -> ParsingResult<String> {
    if Url::parse(href).is_ok() {
        return Ok(href.to_string());
    }

    let base = Url::parse(base_url).map_err(|e| ParsingError::UrlResolutionFailed {
        url: base_url.to_string(),
        reason: format!("Invalid base URL: {e}"),
        base_url: None,
    })?;

    base.join(href)
        .map(String::from)
        .map_err(|e| ParsingError::UrlResolutionFailed {
            url: href.to_string(),
            reason: format!("Failed to join URL: {e}"),
            base_url: Some(base_url.to_string()),
        })
}
