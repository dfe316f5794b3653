use crate::UrlError;
use url::Url;

/// Normalizes a URL to its canonical form for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Lowercase the host and remove a `www.` prefix
/// 3. Normalize the path:
///    - Collapse repeated slashes
///    - Remove dot segments (`.` and `..`)
///    - Directory-like paths end with `/`; file-like paths (last segment
///      has an extension, e.g. `story.html`) do not
///    - Empty path becomes `/`
/// 4. Drop the query string
/// 5. Drop the fragment
///
/// The canonical form is therefore `scheme://host[:port]/path`.
///
/// # Examples
///
/// ```
/// use novina::url::normalize_url;
///
/// let url = normalize_url("https://WWW.Poskok.info/2023/05/vijest?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://poskok.info/2023/05/vijest/");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Normalizes a URL path: dot segments, repeated slashes, trailing slash
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let Some(last) = segments.last() else {
        return "/".to_string();
    };

    let file_like = last.contains('.');
    let mut result = format!("/{}", segments.join("/"));
    if !file_like {
        result.push('/');
    }
    result
}
