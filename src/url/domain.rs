use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_sieve::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Extracts the network location (`host` or `host:port`) from a URL
///
/// The port is only present when it was given explicitly and differs from the
/// scheme's default. Scope checks are keyed on this value.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_sieve::url::host_key;
///
/// let url = Url::parse("http://127.0.0.1:8080/page").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// The key request pacing is tracked under
///
/// A `www.` host shares its key with the bare host, so both names of one
/// site count against the same delay.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_sieve::url::pacing_key;
///
/// let bare = Url::parse("https://example.org/a").unwrap();
/// let www = Url::parse("https://www.example.org/b").unwrap();
/// assert_eq!(pacing_key(&bare), pacing_key(&www));
/// ```
pub fn pacing_key(url: &Url) -> Option<String> {
    let key = host_key(url)?;
    match key.strip_prefix("www.") {
        Some(bare) if !bare.is_empty() => Some(bare.to_string()),
        _ => Some(key),
    }
}
