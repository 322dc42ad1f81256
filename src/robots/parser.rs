//! Robots.txt rule evaluation
//!
//! Allow/Disallow matching is delegated to the robotstxt crate (Google's
//! matcher). Crawl-delay, which that matcher ignores, is read here.

use robotstxt::DefaultMatcher;

#[derive(Debug, Clone)]
enum Rules {
    AllowAll,
    DisallowAll,
    Content(String),
}

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    rules: Rules,
}

impl ParsedRobots {
    /// Creates a ParsedRobots from raw robots.txt content
    ///
    /// Content the matcher cannot make sense of places no restrictions.
    pub fn from_content(content: &str) -> Self {
        let rules = if content.trim().is_empty() {
            Rules::AllowAll
        } else {
            Rules::Content(content.to_string())
        };
        Self { rules }
    }

    /// Creates a permissive ParsedRobots that allows everything
    pub fn allow_all() -> Self {
        Self {
            rules: Rules::AllowAll,
        }
    }

    /// Creates a ParsedRobots that forbids every URL
    pub fn disallow_all() -> Self {
        Self {
            rules: Rules::DisallowAll,
        }
    }

    /// Checks if a URL is allowed for the given user agent token
    ///
    /// `url` may be absolute or a bare path.
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match &self.rules {
            Rules::AllowAll => true,
            Rules::DisallowAll => false,
            Rules::Content(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, user_agent, url)
            }
        }
    }

    /// Gets the crawl delay (seconds) that applies to the given user agent
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let Rules::Content(content) = &self.rules else {
            return None;
        };

        let agent = user_agent.to_lowercase();
        let mut group_agents: Vec<String> = Vec::new();
        let mut group_open = false;
        let mut specific = None;
        let mut wildcard = None;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if group_open {
                        group_agents.clear();
                        group_open = false;
                    }
                    group_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    group_open = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }
                    if group_agents.iter().any(|a| a == &agent) {
                        specific.get_or_insert(delay);
                    } else if group_agents.iter().any(|a| a == "*") {
                        wildcard.get_or_insert(delay);
                    }
                }
                _ => group_open = true,
            }
        }

        specific.or(wildcard)
    }
}
