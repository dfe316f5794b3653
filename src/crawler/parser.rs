//! Listing page parser
//!
//! Extracts candidate article links (plus their anchor text) from category
//! and archive listing pages.
//!
//! # Link Rules
//!
//! **Include:** anchors matching the configured selector whose resolved URL
//! is on the harvested site.
//!
//! **Exclude:**
//! - `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only links
//! - Anchors with a `download` attribute
//! - URLs containing any configured exclude pattern (`/category/`, `/tag/`, ...)
//! - The site root and the listing page itself
//! - URLs whose last path segment has no letters (`/2023/05/`)
//! - URLs or anchor texts containing a blocked term

use crate::config::SiteConfig;
use crate::url::{normalize_url, same_site};
use crate::UrlError;
use scraper::{Html, Selector};
use url::Url;

/// A candidate article link found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLink {
    /// Canonical URL
    pub url: Url,
    /// Anchor text, whitespace collapsed
    pub title: Option<String>,
}

/// Decides which discovered URLs are article candidates
#[derive(Debug, Clone)]
pub struct LinkFilter {
    base: Url,
    exclude_patterns: Vec<String>,
    blocked_terms: Vec<String>,
}

impl LinkFilter {
    pub fn new(base: Url, exclude_patterns: Vec<String>, blocked_terms: Vec<String>) -> Self {
        Self {
            base,
            exclude_patterns,
            blocked_terms: blocked_terms.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    pub fn from_site(config: &SiteConfig) -> Result<Self, UrlError> {
        Ok(Self::new(
            normalize_url(&config.base_url)?,
            config.exclude_patterns.clone(),
            config.blocked_terms.clone(),
        ))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Checks a resolved (not yet normalized) URL and its anchor text
    pub fn accepts(&self, raw: &Url, canonical: &Url, anchor: Option<&str>) -> bool {
        if !same_site(canonical, &self.base) || canonical.path() == "/" {
            return false;
        }

        let raw_str = raw.as_str();
        if self
            .exclude_patterns
            .iter()
            .any(|pattern| raw_str.contains(pattern.as_str()))
        {
            return false;
        }

        let last_segment = canonical
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .unwrap_or("");
        if !last_segment.chars().any(char::is_alphabetic) {
            return false;
        }

        if !self.blocked_terms.is_empty() {
            let url_lower = raw_str.to_lowercase();
            let anchor_lower = anchor.map(str::to_lowercase).unwrap_or_default();
            if self
                .blocked_terms
                .iter()
                .any(|term| url_lower.contains(term.as_str()) || anchor_lower.contains(term.as_str()))
            {
                return false;
            }
        }

        true
    }
}

/// Extracts candidate article links from a listing page
///
/// Links are returned in document order, each canonical URL once. When the
/// same URL appears several times (image link and headline link), the first
/// non-empty anchor text is kept.
///
/// # Example
///
/// ```
/// use novina::crawler::{extract_listing_links, LinkFilter};
/// use scraper::Selector;
/// use url::Url;
///
/// let base = Url::parse("https://poskok.info/").unwrap();
/// let filter = LinkFilter::new(base.clone(), vec!["/category/".to_string()], vec![]);
/// let page = Url::parse("https://poskok.info/category/sport/").unwrap();
/// let html = r#"<a href="/2023/05/pobjeda/">Pobjeda</a><a href="/category/sport/">Sport</a>"#;
///
/// let links = extract_listing_links(html, &page, &Selector::parse("a[href]").unwrap(), &filter);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].url.as_str(), "https://poskok.info/2023/05/pobjeda/");
/// ```
pub fn extract_listing_links(
    html: &str,
    page_url: &Url,
    selector: &Selector,
    filter: &LinkFilter,
) -> Vec<ListingLink> {
    let document = Html::parse_document(html);
    let page_canonical = normalize_url(page_url.as_str()).ok();
    let mut links: Vec<ListingLink> = Vec::new();

    for element in document.select(selector) {
        if element.value().attr("download").is_some() {
            continue;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(raw) = resolve_link(href, page_url) else {
            continue;
        };
        let Ok(canonical) = normalize_url(raw.as_str()) else {
            continue;
        };
        if page_canonical.as_ref() == Some(&canonical) {
            continue;
        }

        let text = collapse_whitespace(&element.text().collect::<String>());
        let title = (!text.is_empty()).then_some(text);

        if !filter.accepts(&raw, &canonical, title.as_deref()) {
            continue;
        }

        match links.iter_mut().find(|l| l.url == canonical) {
            Some(existing) => {
                if existing.title.is_none() {
                    existing.title = title;
                }
            }
            None => links.push(ListingLink {
                url: canonical,
                title,
            }),
        }
    }

    links
}

/// Resolves a link href to an absolute HTTP(S) URL
///
/// Returns None for special schemes, fragment-only links and invalid URLs.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then_some(absolute)
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> LinkFilter {
        LinkFilter::new(
            Url::parse("https://poskok.info/").unwrap(),
            vec![
                "/category/".to_string(),
                "/tag/".to_string(),
                "/page/".to_string(),
            ],
            vec!["horoskop".to_string()],
        )
    }

    fn page() -> Url {
        Url::parse("https://poskok.info/category/sport/").unwrap()
    }

    fn extract(html: &str) -> Vec<ListingLink> {
        extract_listing_links(html, &page(), &Selector::parse("a[href]").unwrap(), &filter())
    }

    fn urls(links: &[ListingLink]) -> Vec<&str> {
        links.iter().map(|l| l.url.as_str()).collect()
    }

    #[test]
    fn test_extracts_relative_and_absolute_links() {
        let html = r#"
            <article><h2><a href="/2023/05/prva-vijest/">Prva vijest</a></h2></article>
            <article><h2><a href="https://www.poskok.info/2023/05/druga-vijest">Druga</a></h2></article>
        "#;
        let links = extract(html);
        assert_eq!(
            urls(&links),
            vec![
                "https://poskok.info/2023/05/prva-vijest/",
                "https://poskok.info/2023/05/druga-vijest/"
            ]
        );
        assert_eq!(links[0].title.as_deref(), Some("Prva vijest"));
    }

    #[test]
    fn test_excludes_navigation_and_foreign_hosts() {
        let html = r##"
            <a href="/">Naslovnica</a>
            <a href="/category/sport/">Sport</a>
            <a href="/category/sport/page/2/">Sljedeća</a>
            <a href="/tag/nogomet/">nogomet</a>
            <a href="/2023/05/">Svibanj</a>
            <a href="https://facebook.com/share?u=x">Podijeli</a>
            <a href="mailto:info@poskok.info">Mail</a>
            <a href="javascript:void(0)">JS</a>
            <a href="#comments">Komentari</a>
            <a href="/2023/05/dnevni-horoskop/">Horoskop</a>
            <a href="/2023/05/prava-vijest/">Vijest</a>
        "##;
        assert_eq!(
            urls(&extract(html)),
            vec!["https://poskok.info/2023/05/prava-vijest/"]
        );
    }

    #[test]
    fn test_blocked_term_in_anchor_text() {
        let html = r#"<a href="/2023/05/zvijezde-kazu/">Tjedni HOROSKOP</a>"#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_duplicates_keep_first_title() {
        let html = r#"
            <a href="/2023/05/vijest/"><img src="x.jpg"></a>
            <a href="/2023/05/vijest/?utm_source=fb">Vijest   dana</a>
            <a href="/2023/05/vijest/#comments">Komentari</a>
        "#;
        let links = extract(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].title.as_deref(), Some("Vijest dana"));
    }

    #[test]
    fn test_download_links_skipped() {
        let html = r#"<a href="/files/izvjesce.pdf" download>PDF</a>"#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_custom_selector() {
        let html = r#"
            <nav><a href="/o-nama/">O nama</a></nav>
            <h3 class="entry-title"><a href="/2023/05/vijest/">Vijest</a></h3>
        "#;
        let selector = Selector::parse("h3.entry-title a[href]").unwrap();
        let links = extract_listing_links(html, &page(), &selector, &filter());
        assert_eq!(urls(&links), vec!["https://poskok.info/2023/05/vijest/"]);
    }

    #[test]
    fn test_resolve_link() {
        let base = Url::parse("https://poskok.info/category/sport/").unwrap();
        assert_eq!(
            resolve_link("../kultura/", &base).unwrap().as_str(),
            "https://poskok.info/category/kultura/"
        );
        assert!(resolve_link("tel:123", &base).is_none());
        assert!(resolve_link("  ", &base).is_none());
        assert!(resolve_link("ftp://poskok.info/x", &base).is_none());
    }
}
