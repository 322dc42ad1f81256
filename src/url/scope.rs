use crate::config::SiteConfig;
use crate::url::host_key;
use std::collections::BTreeSet;
use url::Url;

/// Static-asset extensions that are never crawled
pub const BLOCKED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "css", "js", "woff", "woff2", "ttf", "eot",
    "mp4", "webm", "zip", "rar",
];

/// Scope predicate for a single-site crawl
///
/// A URL is in scope when:
/// - its scheme is `http` or `https`
/// - its network location is in the allow-set
/// - its path does not end in a blocked static-asset extension
///
/// Malformed URLs are rejected, never reported as errors.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    allowed: BTreeSet<String>,
}

impl ScopeFilter {
    /// Creates a filter that accepts exactly the given `host[:port]` values
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = hosts
            .into_iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        Self { allowed }
    }

    /// Creates a filter for a domain, with and without its `www.` prefix
    ///
    /// # Examples
    ///
    /// ```
    /// use site_sieve::url::ScopeFilter;
    ///
    /// let scope = ScopeFilter::for_domain("example.com");
    /// assert!(scope.accepts("https://www.example.com/about"));
    /// assert!(scope.accepts("http://example.com/report.pdf"));
    /// assert!(!scope.accepts("https://example.com/logo.png"));
    /// assert!(!scope.accepts("https://other.org/"));
    /// ```
    pub fn for_domain(domain: &str) -> Self {
        let domain = domain.trim().to_lowercase();
        let bare = domain.strip_prefix("www.").unwrap_or(&domain).to_string();
        let www = format!("www.{}", bare);
        Self::new([bare, www])
    }

    /// Creates the filter described by the `[site]` configuration section
    pub fn from_site(site: &SiteConfig) -> Self {
        let mut scope = Self::for_domain(&site.domain);
        scope.allowed.extend(
            site.extra_hosts
                .iter()
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty()),
        );
        scope
    }

    /// Checks a URL string; unparsable input is simply out of scope
    pub fn accepts(&self, url: &str) -> bool {
        match Url::parse(url.trim()) {
            Ok(parsed) => self.accepts_url(&parsed),
            Err(_) => false,
        }
    }

    /// Checks an already parsed URL
    pub fn accepts_url(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        let Some(netloc) = host_key(url) else {
            return false;
        };
        if !self.allowed.contains(&netloc) {
            return false;
        }

        !has_blocked_extension(url.path())
    }

    /// The allow-set, sorted
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }
}

/// True when the path's final segment ends in a blocked extension
fn has_blocked_extension(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.contains('/') => {
            let ext = ext.to_ascii_lowercase();
            BLOCKED_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}
