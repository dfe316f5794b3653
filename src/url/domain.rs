use url::Url;

/// Extracts the lowercase host from a URL, without a `www.` prefix
///
/// # Examples
///
/// ```
/// use url::Url;
/// use novina::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Poskok.info/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("poskok.info".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let host = h.to_lowercase();
        match host.strip_prefix("www.") {
            Some(stripped) => stripped.to_string(),
            None => host,
        }
    })
}

/// Returns true if both URLs point at the same site (host and port)
pub fn same_site(a: &Url, b: &Url) -> bool {
    extract_domain(a) == extract_domain(b) && a.port_or_known_default() == b.port_or_known_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_same_site_ignores_www() {
        let a = Url::parse("https://www.poskok.info/a/").unwrap();
        let b = Url::parse("https://poskok.info/b/").unwrap();
        assert!(same_site(&a, &b));
    }

    #[test]
    fn test_same_site_rejects_other_hosts_and_ports() {
        let a = Url::parse("https://poskok.info/").unwrap();
        let other = Url::parse("https://facebook.com/poskok").unwrap();
        assert!(!same_site(&a, &other));

        let local_a = Url::parse("http://127.0.0.1:8080/").unwrap();
        let local_b = Url::parse("http://127.0.0.1:9090/").unwrap();
        assert!(!same_site(&local_a, &local_b));
    }
}
