//! Robots.txt handling module
//!
//! The collector fetches the site's robots.txt once per run, skips
//! disallowed listing pages and links, and raises the politeness floor to
//! the advertised `Crawl-delay`.

mod parser;

pub use parser::RobotsPolicy;

use crate::crawler::{FetchError, Fetcher};
use url::Url;

/// Fetches and parses `/robots.txt` for the site at `base`
///
/// A missing file (404) or any fetch failure yields an allow-all policy.
pub async fn fetch_robots(fetcher: &Fetcher, base: &Url, agent: &str) -> RobotsPolicy {
    let robots_url = match base.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL from {}: {}", base, e);
            return RobotsPolicy::allow_all(agent);
        }
    };

    match fetcher.fetch(robots_url.as_str()).await {
        Ok(page) => {
            tracing::info!("Loaded robots.txt from {}", robots_url);
            RobotsPolicy::from_content(&page.text(), agent)
        }
        Err(failure) if failure.kind == FetchError::NotFound => {
            tracing::debug!("No robots.txt at {}", robots_url);
            RobotsPolicy::allow_all(agent)
        }
        Err(failure) => {
            tracing::warn!(
                "robots.txt unavailable at {} ({}), allowing all",
                robots_url,
                failure
            );
            RobotsPolicy::allow_all(agent)
        }
    }
}
