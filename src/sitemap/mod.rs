//! Sitemap seeding
//!
//! Seeding is best-effort: a sitemap that cannot be fetched or parsed is
//! skipped with a warning and never affects seeds from other sources.
//! Sitemap indexes are expanded into their child sitemaps.

use crate::url::ScopeFilter;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// Child sitemaps are followed at most this many levels below a configured one
const MAX_NESTING: usize = 2;

/// Reasons a single sitemap was skipped
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("content type '{0}' is not XML")]
    NotXml(String),

    #[error("malformed XML: {0}")]
    Parse(#[from] quick_xml::Error),
}

/// The two sitemap document shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<urlset>`: page locations
    UrlSet(Vec<String>),

    /// `<sitemapindex>`: locations of further sitemaps
    Index(Vec<String>),
}

/// Parses a sitemap document, returning every `<loc>` value in order
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut is_index = false;
    let mut saw_root = false;
    let mut in_loc = false;
    let mut current = String::new();
    let mut locations = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                if !saw_root {
                    saw_root = true;
                    is_index = name.as_ref() == b"sitemapindex";
                }
                if name.as_ref() == b"loc" {
                    in_loc = true;
                    current.clear();
                }
            }
            Event::Text(t) if in_loc => current.push_str(&t.unescape()?),
            Event::CData(c) if in_loc => current.push_str(&String::from_utf8_lossy(&c)),
            Event::End(e) => {
                if e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                    let loc = current.trim();
                    if !loc.is_empty() {
                        locations.push(loc.to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(if is_index {
        SitemapDocument::Index(locations)
    } else {
        SitemapDocument::UrlSet(locations)
    })
}

/// Fetches one sitemap and parses it
///
/// Only 2xx responses whose Content-Type mentions XML are parsed.
pub async fn fetch_sitemap(client: &Client, url: &str) -> Result<SitemapDocument, SitemapError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SitemapError::Status(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !content_type.to_ascii_lowercase().contains("xml") {
        return Err(SitemapError::NotXml(content_type));
    }

    let body = response.text().await?;
    Ok(parse_sitemap(&body)?)
}

/// Collects in-scope page URLs from the configured sitemaps
///
/// # Returns
///
/// Deduplicated page URLs in first-seen order. Failures are logged and skipped.
pub async fn collect_sitemap_urls(
    client: &Client,
    sitemaps: &[String],
    scope: &ScopeFilter,
) -> Vec<String> {
    let mut pending: VecDeque<(String, usize)> =
        sitemaps.iter().map(|s| (s.clone(), 0)).collect();
    let mut fetched: HashSet<String> = HashSet::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut urls = Vec::new();

    while let Some((sitemap_url, depth)) = pending.pop_front() {
        if !fetched.insert(sitemap_url.clone()) {
            continue;
        }

        let document = match fetch_sitemap(client, &sitemap_url).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Skipping sitemap {}: {}", sitemap_url, e);
                continue;
            }
        };

        match document {
            SitemapDocument::UrlSet(locations) => {
                let before = urls.len();
                for loc in locations {
                    if scope.accepts(&loc) && seen.insert(loc.clone()) {
                        urls.push(loc);
                    }
                }
                tracing::info!(
                    "Sitemap {} contributed {} seed URLs",
                    sitemap_url,
                    urls.len() - before
                );
            }
            SitemapDocument::Index(children) => {
                if depth >= MAX_NESTING {
                    tracing::warn!(
                        "Sitemap index {} nested too deeply; ignoring {} children",
                        sitemap_url,
                        children.len()
                    );
                    continue;
                }
                tracing::debug!(
                    "Sitemap index {} lists {} sitemaps",
                    sitemap_url,
                    children.len()
                );
                pending.extend(children.into_iter().map(|c| (c, depth + 1)));
            }
        }
    }

    urls
}
