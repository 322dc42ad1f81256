//! Link discovery for HTML pages
//!
//! Every `<a href>` on the page is resolved against the page URL; links that
//! leave the site or point at static assets are dropped by the scope filter.

use crate::url::ScopeFilter;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts the in-scope links of an HTML page
///
/// # Link Rules
///
/// **Excluded:**
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Empty hrefs
/// - Anything rejected by the scope filter
///
/// Fragments are removed after resolution, so `/a#top` and `/a` are the same
/// link. `rel="nofollow"` links are followed.
///
/// # Returns
///
/// Absolute URLs, deduplicated, in first-seen order
///
/// # Example
///
/// ```
/// use site_sieve::crawler::discover_links;
/// use site_sieve::url::ScopeFilter;
/// use url::Url;
///
/// let html = r#"<a href="/page">Link</a><a href="https://other.org/">Away</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let links = discover_links(&base, html, &ScopeFilter::for_domain("example.com"));
/// assert_eq!(links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn discover_links(base_url: &Url, html: &str, scope: &ScopeFilter) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_link(href, base_url) else {
            continue;
        };
        if scope.accepts(&absolute) && seen.insert(absolute.clone()) {
            links.push(absolute);
        }
    }

    links
}

/// Resolves a link href to an absolute URL without its fragment
///
/// Returns None for non-navigational schemes and unparsable hrefs.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}
