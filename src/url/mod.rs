//! URL handling module
//!
//! This module provides canonical URL normalization (the deduplication key for
//! discovered links), same-site checks, and construction of the listing and
//! pagination URLs the link collector walks.

mod domain;
mod normalize;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, same_site};
pub use normalize::normalize_url;

/// Builds a category listing URL from a path template
///
/// `{slug}` is replaced by the category slug and `{year}` (if present) by
/// the year of the walk.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use novina::url::category_listing_url;
///
/// let base = Url::parse("https://poskok.info").unwrap();
/// let url = category_listing_url(&base, "/category/{slug}/", "sport", None).unwrap();
/// assert_eq!(url.as_str(), "https://poskok.info/category/sport/");
/// ```
pub fn category_listing_url(
    base: &Url,
    template: &str,
    slug: &str,
    year: Option<i32>,
) -> UrlResult<Url> {
    let mut path = template.replace("{slug}", slug);
    if let Some(year) = year {
        path = path.replace("{year}", &year.to_string());
    }
    join_listing(base, &path)
}

/// Builds a month archive listing URL (`{year}` and zero-padded `{month}`)
pub fn archive_listing_url(base: &Url, template: &str, year: i32, month: u32) -> UrlResult<Url> {
    let path = template
        .replace("{year}", &year.to_string())
        .replace("{month}", &format!("{:02}", month));
    join_listing(base, &path)
}

fn join_listing(base: &Url, path: &str) -> UrlResult<Url> {
    if path.contains('{') {
        return Err(UrlError::Malformed(format!(
            "unresolved placeholder in listing path '{}'",
            path
        )));
    }
    base.join(path).map_err(|e| UrlError::Parse(e.to_string()))
}

/// Returns the URL of page `page` of a paginated listing
///
/// Page 1 is the listing itself; page n is `<listing>/page/<n>/`, keeping
/// any query string.
pub fn page_url(listing: &Url, page: u32) -> Url {
    if page <= 1 {
        return listing.clone();
    }
    let mut url = listing.clone();
    let path = format!("{}/page/{}/", listing.path().trim_end_matches('/'), page);
    url.set_path(&path);
    url
}

/// Extracts a publication year from a URL path such as `/2023/05/story/`
pub fn year_from_path(url: &Url) -> Option<i32> {
    url.path_segments()?
        .filter(|s| s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|s| s.parse::<i32>().ok())
        .find(|year| (1900..=2100).contains(year))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://poskok.info").unwrap()
    }

    #[test]
    fn test_category_listing_with_year() {
        let url =
            category_listing_url(&base(), "/{year}/?category_name={slug}", "sport", Some(2021))
                .unwrap();
        assert_eq!(url.as_str(), "https://poskok.info/2021/?category_name=sport");
    }

    #[test]
    fn test_unresolved_year_placeholder_is_an_error() {
        let result = category_listing_url(&base(), "/category/{slug}/{year}/", "sport", None);
        assert!(matches!(result, Err(UrlError::Malformed(_))));
    }

    #[test]
    fn test_archive_listing_pads_month() {
        let url = archive_listing_url(&base(), "/{year}/{month}/", 2019, 3).unwrap();
        assert_eq!(url.as_str(), "https://poskok.info/2019/03/");
    }

    #[test]
    fn test_page_url() {
        let listing = Url::parse("https://poskok.info/category/sport/").unwrap();
        assert_eq!(page_url(&listing, 1), listing);
        assert_eq!(
            page_url(&listing, 2).as_str(),
            "https://poskok.info/category/sport/page/2/"
        );
    }

    #[test]
    fn test_page_url_keeps_query() {
        let listing = Url::parse("https://poskok.info/2021/?category_name=sport").unwrap();
        assert_eq!(
            page_url(&listing, 3).as_str(),
            "https://poskok.info/2021/page/3/?category_name=sport"
        );
    }

    #[test]
    fn test_year_from_path() {
        let url = Url::parse("https://poskok.info/2023/05/story/").unwrap();
        assert_eq!(year_from_path(&url), Some(2023));

        let url = Url::parse("https://poskok.info/story-1234/").unwrap();
        assert_eq!(year_from_path(&url), None);
    }
}
