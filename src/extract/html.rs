//! HTML article extraction
//!
//! Readability isolates the main content; scraper then flattens that content
//! to plain text with navigation and boilerplate elements removed.

use crate::extract::panic_message;
use scraper::{Html, Node, Selector};
use std::panic::{catch_unwind, AssertUnwindSafe};
use url::Url;

/// Elements dropped from the readability summary before flattening
const SUMMARY_SKIPPED: &[&str] = &["script", "style", "noscript", "nav", "header", "footer"];

/// Elements that never contribute visible text in a full document
const DOCUMENT_SKIPPED: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Extracts the title and main text of an HTML page
///
/// The readability summary is used when it contains at least `min_words`
/// words. Otherwise the summary probably missed the real content and all
/// visible text of the raw document is used instead.
///
/// # Arguments
///
/// * `html` - The raw HTML document
/// * `page_url` - The page URL, used by readability to resolve links
/// * `min_words` - Minimum word count for the readability summary
///
/// # Returns
///
/// `(title, text)`; either may be empty.
pub fn extract_html(html: &str, page_url: &Url, min_words: usize) -> (String, String) {
    let article = catch_unwind(AssertUnwindSafe(|| {
        readability::extractor::extract(&mut html.as_bytes(), page_url)
    }));

    let (mut title, summary_text) = match article {
        Ok(Ok(product)) => {
            let fragment = Html::parse_fragment(&product.content);
            (collapse(&product.title), visible_text(&fragment, SUMMARY_SKIPPED))
        }
        Ok(Err(e)) => {
            tracing::debug!("Readability failed for {}: {}", page_url, e);
            (String::new(), String::new())
        }
        Err(payload) => {
            tracing::warn!(
                "Readability panicked for {}: {}",
                page_url,
                panic_message(payload)
            );
            (String::new(), String::new())
        }
    };

    let document = Html::parse_document(html);
    if title.is_empty() {
        title = document_title(&document).unwrap_or_default();
    }

    if summary_text.split_whitespace().count() >= min_words {
        return (title, summary_text);
    }

    (title, visible_text(&document, DOCUMENT_SKIPPED))
}

/// Collects every text node outside the skipped elements
///
/// Each text node is trimmed, empty nodes are dropped, and the rest are joined
/// with single spaces.
pub fn visible_text(html: &Html, skipped: &[&str]) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in html.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => skipped.contains(&element.name()),
            _ => false,
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}

/// Extracts the `<title>` of a document, whitespace-collapsed
fn document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| collapse(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
