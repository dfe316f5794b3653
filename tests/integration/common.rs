//! Shared fixtures: a mock news site with one paginated category

use novina::config::{parse_config, Config};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const CATEGORY_PATH: &str = "/category/vijesti/";

/// Creates a test configuration pointing at the mock server
pub fn create_test_config(base_url: &str, data_dir: &Path) -> Config {
    let toml = format!(
        r#"
[site]
base-url = "{base_url}"
source-name = "novina-test"

[[site.categories]]
name = "Vijesti"
slug = "vijesti"

[crawl]
batch-link-size = 4
max-pages-per-category = 10

[fetch]
timeout = 5.0
max-retries = 3
retry-delay = 0.01
max-backoff = 0.05
crawl-delay-min = 0.0
crawl-delay-max = 0.0

[processing]
max-workers = 3
checkpoint-interval = 1
min-content-length = 50

[user-agent]
crawler-name = "NovinaTest"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
data-dir = '{data_dir}'
"#,
        data_dir = data_dir.display()
    );
    parse_config(&toml).expect("test config is valid")
}

pub fn article_path(n: usize) -> String {
    format!("/2023/05/clanak-{}/", n)
}

pub fn listing_path(page: u32) -> String {
    if page <= 1 {
        CATEGORY_PATH.to_string()
    } else {
        format!("{}page/{}/", CATEGORY_PATH, page)
    }
}

/// A listing page with navigation chrome around the given article numbers
pub fn listing_page(articles: impl IntoIterator<Item = usize>) -> String {
    let items: String = articles
        .into_iter()
        .map(|n| {
            format!(
                r#"<li><a href="{}">Naslov clanka {}</a></li>"#,
                article_path(n),
                n
            )
        })
        .collect();
    format!(
        r#"<html><body>
        <nav><a href="/">Naslovnica</a> <a href="{cat}">Vijesti</a> <a href="/tag/izbori/">Izbori</a></nav>
        <ul>{items}</ul>
        <div class="pagination"><a href="{cat}page/2/">2</a></div>
        </body></html>"#,
        cat = CATEGORY_PATH,
        items = items
    )
}

pub fn article_page(title: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{title} | Novina</title></head><body>
        <article>
          <h1 class="entry-title">{title}</h1>
          <time datetime="2023-05-14T10:00:00+02:00">14. svibnja 2023.</time>
          <span class="author">Ivana Horvat</span>
          <div class="entry-content"><p>{body}</p></div>
        </article>
        </body></html>"#
    )
}

/// A Croatian article body, distinct per `n`
pub fn local_body(n: usize) -> String {
    format!(
        "Vlada je danas u Zagrebu predstavila plan broj {} koji se odnosi na gradnju \
         novih cesta i mostova. Ministar je rekao da će radovi početi prije kraja godine.",
        n
    )
}

pub fn english_body() -> String {
    "The government said that the new plan would be announced after the elections, \
     and the ministers were asked about the same issue through the week."
        .to_string()
}

pub struct TestSite {
    pub server: MockServer,
    pub dir: TempDir,
    pub config: Config,
}

/// Serves one category whose listing pages hold `pages[i]` links each,
/// followed by an empty page. Article `n` (1-based) has body `bodies[n - 1]`.
pub async fn mount_site(pages: &[usize], bodies: &[String]) -> TestSite {
    assert_eq!(pages.iter().sum::<usize>(), bodies.len());
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let mut next = 1;
    for (i, count) in pages.iter().enumerate() {
        mount_html(&server, &listing_path(i as u32 + 1), listing_page(next..next + count)).await;
        next += count;
    }
    mount_html(
        &server,
        &listing_path(pages.len() as u32 + 1),
        listing_page(std::iter::empty()),
    )
    .await;

    for (i, body) in bodies.iter().enumerate() {
        let n = i + 1;
        mount_html(&server, &article_path(n), article_page(&format!("Clanak {}", n), body)).await;
    }

    let config = create_test_config(&server.uri(), dir.path());
    TestSite {
        server,
        dir,
        config,
    }
}

pub async fn mount_html(server: &MockServer, at: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

/// Number of requests the server received for one path
pub async fn requests_to(server: &MockServer, at: &str) -> usize {
    let requests: Vec<Request> = server.received_requests().await.unwrap_or_default();
    requests.iter().filter(|r| r.url.path() == at).count()
}
