//! Robots.txt handling module
//!
//! robots.txt is fetched once per run from the site root. Fetch failures and
//! unparsable content never abort the crawl: they degrade to "no restrictions".

mod parser;

pub use parser::ParsedRobots;

use reqwest::{Client, StatusCode};
use url::Url;

/// Robots.txt rules bound to the agent token used for every request
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    rules: ParsedRobots,
    agent: String,
}

impl RobotsPolicy {
    pub fn new(rules: ParsedRobots, agent: impl Into<String>) -> Self {
        Self {
            rules,
            agent: agent.into(),
        }
    }

    /// A policy without any restrictions
    pub fn unrestricted(agent: impl Into<String>) -> Self {
        Self::new(ParsedRobots::allow_all(), agent)
    }

    /// May this agent fetch the URL?
    pub fn allowed(&self, url: &str) -> bool {
        self.rules.is_allowed(url, &self.agent)
    }

    /// The Crawl-delay declared for this agent, in seconds
    pub fn crawl_delay(&self) -> Option<f64> {
        self.rules.crawl_delay(&self.agent)
    }
}

/// Fetches and parses robots.txt for the site containing `site_url`
///
/// # Status handling
///
/// | Response | Policy |
/// |----------|--------|
/// | 2xx | Parse the body |
/// | 401 / 403 | Disallow everything |
/// | Any other status | Allow everything |
/// | Transport error | Allow everything |
pub async fn fetch_robots(client: &Client, site_url: &Url, agent: &str) -> RobotsPolicy {
    let robots_url = match site_url.join("/robots.txt") {
        Ok(u) => u,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL from {}: {}", site_url, e);
            return RobotsPolicy::unrestricted(agent);
        }
    };

    tracing::debug!("Fetching robots.txt from {}", robots_url);

    let response = match client.get(robots_url.clone()).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(
                "Failed to fetch {}: {}; continuing without restrictions",
                robots_url,
                e
            );
            return RobotsPolicy::unrestricted(agent);
        }
    };

    let status = response.status();
    let rules = if status.is_success() {
        match response.text().await {
            Ok(body) => ParsedRobots::from_content(&body),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", robots_url, e);
                ParsedRobots::allow_all()
            }
        }
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracing::info!("{} returned {}; treating site as disallowed", robots_url, status);
        ParsedRobots::disallow_all()
    } else {
        tracing::info!("{} returned {}; no restrictions apply", robots_url, status);
        ParsedRobots::allow_all()
    };

    RobotsPolicy::new(rules, agent)
}
