//! robots.txt rules for the harvested site
//!
//! Allow/disallow matching is delegated to the `robotstxt` crate; the
//! `Crawl-delay` extension is parsed here because that crate ignores it.

use robotstxt::DefaultMatcher;
use std::time::Duration;
use url::Url;

/// robots.txt rules as seen by one user agent
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Raw robots.txt content; `None` means allow everything
    content: Option<String>,
    /// Product token matched against `User-agent` lines
    agent: String,
}

impl RobotsPolicy {
    pub fn from_content(content: &str, agent: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            agent: agent.to_string(),
        }
    }

    /// A permissive policy, used when robots.txt is missing or unreachable
    pub fn allow_all(agent: &str) -> Self {
        Self {
            content: None,
            agent: agent.to_string(),
        }
    }

    pub fn is_allow_all(&self) -> bool {
        self.content.as_deref().map_or(true, |c| c.trim().is_empty())
    }

    /// Checks whether the agent may fetch `url`
    pub fn allows(&self, url: &Url) -> bool {
        match self.content.as_deref() {
            None => true,
            Some(content) if content.trim().is_empty() => true,
            Some(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, &self.agent, url.as_str())
            }
        }
    }

    /// `Crawl-delay` for this agent; a group naming the agent wins over `*`
    pub fn crawl_delay(&self) -> Option<Duration> {
        let content = self.content.as_deref()?;
        let agent = self.agent.to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut specific = None;
        let mut wildcard = None;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                if !in_agent_lines {
                    group.clear();
                }
                group.push(value.to_lowercase());
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }
            let Ok(seconds) = value.parse::<f64>() else {
                continue;
            };
            if !seconds.is_finite() || seconds < 0.0 {
                continue;
            }
            let delay = Duration::from_secs_f64(seconds);

            if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                specific = Some(delay);
            } else if group.iter().any(|ua| ua == "*") {
                wildcard = Some(delay);
            }
        }

        specific.or(wildcard)
    }
}
