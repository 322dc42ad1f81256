use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Site-Sieve
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of URLs visited in one run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Minimum time between requests to the same host (seconds, fractional allowed)
    #[serde(rename = "delay-seconds", default = "default_delay_seconds")]
    pub delay_seconds: f64,

    /// Timeout applied to every request
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum number of visits in flight at once
    #[serde(rename = "max-concurrent-fetches", default = "default_concurrency")]
    pub max_concurrent_fetches: u32,

    /// Below this many words the readability summary is considered a miss
    #[serde(rename = "min-article-words", default = "default_min_article_words")]
    pub min_article_words: usize,

    /// Also keep .doc/.xls/.ppt(x) files in the asset store
    #[serde(rename = "include-docs", default)]
    pub include_docs: bool,
}

impl CrawlerConfig {
    /// The configured politeness delay as a Duration
    ///
    /// Values that are not representable (negative, NaN, too large) give zero;
    /// validation rejects them before a crawl starts.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_seconds).unwrap_or(Duration::ZERO)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            delay_seconds: default_delay_seconds(),
            request_timeout_secs: default_request_timeout(),
            max_concurrent_fetches: default_concurrency(),
            min_article_words: default_min_article_words(),
            include_docs: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt product token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version`, followed by ` (+ContactURL; ContactEmail)`
    /// when contact details are configured.
    pub fn signature(&self) -> String {
        let base = format!("{}/{}", self.crawler_name, self.crawler_version);
        let contact: Vec<String> = [
            self.contact_url.as_ref().map(|u| format!("+{}", u)),
            self.contact_email.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contact.is_empty() {
            base
        } else {
            format!("{} ({})", base, contact.join("; "))
        }
    }

    /// The token matched against `User-agent:` lines in robots.txt
    pub fn robots_token(&self) -> &str {
        &self.crawler_name
    }
}

/// The single site being harvested
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Bare domain; both it and its `www.` form are in scope
    pub domain: String,

    /// Further host[:port] values to treat as in scope
    #[serde(rename = "extra-hosts", default)]
    pub extra_hosts: Vec<String>,

    /// Tag attached to every QA record
    #[serde(rename = "site-tag", default)]
    pub site_tag: Option<String>,

    /// URLs the crawl starts from
    #[serde(rename = "start-urls", default)]
    pub start_urls: Vec<String>,

    /// Sitemap documents used for seeding
    #[serde(default)]
    pub sitemaps: Vec<String>,
}

impl SiteConfig {
    /// The QA tag for this site, defaulting to the first label of the domain
    pub fn tag(&self) -> String {
        match &self.site_tag {
            Some(tag) if !tag.trim().is_empty() => tag.trim().to_string(),
            _ => {
                let domain = self.domain.trim().to_lowercase();
                let domain = domain.strip_prefix("www.").unwrap_or(&domain);
                domain.split('.').next().unwrap_or(domain).to_string()
            }
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding both streams and the asset store
    #[serde(rename = "data-dir", default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Hard cap on the length of QA answers, in characters
    #[serde(rename = "answer-max-chars", default = "default_answer_max_chars")]
    pub answer_max_chars: usize,
}

impl OutputConfig {
    pub fn raw_pages_path(&self) -> PathBuf {
        self.data_dir.join("raw_pages.jsonl")
    }

    pub fn qa_path(&self) -> PathBuf {
        self.data_dir.join("qa.jsonl")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.data_dir.join("assets")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            answer_max_chars: default_answer_max_chars(),
        }
    }
}

fn default_max_pages() -> u32 {
    3000
}

fn default_delay_seconds() -> f64 {
    1.5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_concurrency() -> u32 {
    1
}

fn default_min_article_words() -> usize {
    50
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_answer_max_chars() -> usize {
    1000
}
