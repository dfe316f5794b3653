//! Fetcher retry behaviour against real HTTP responses

use crate::common::{create_test_config, requests_to};
use novina::crawler::{FetchError, Fetcher};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn fetcher_for(server: &MockServer) -> (Fetcher, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    (Fetcher::new(&config).unwrap(), dir)
}

#[tokio::test]
async fn test_service_unavailable_exhausts_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2023/05/zauzeto/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (fetcher, _dir) = fetcher_for(&server).await;
    let url = format!("{}/2023/05/zauzeto/", server.uri());
    let failure = fetcher.fetch(&url).await.unwrap_err();

    assert_eq!(failure.kind, FetchError::HttpError(503));
    assert_eq!(failure.attempts, 3);
    assert_eq!(requests_to(&server, "/2023/05/zauzeto/").await, 3);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;

    let (fetcher, _dir) = fetcher_for(&server).await;
    let url = format!("{}/2023/05/nema/", server.uri());
    let failure = fetcher.fetch(&url).await.unwrap_err();

    assert_eq!(failure.kind, FetchError::NotFound);
    assert_eq!(failure.attempts, 1);
    assert_eq!(requests_to(&server, "/2023/05/nema/").await, 1);
}

#[tokio::test]
async fn test_transient_failure_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2023/05/oporavak/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2023/05/oporavak/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Sadržaj</p>"))
        .mount(&server)
        .await;

    let (fetcher, _dir) = fetcher_for(&server).await;
    let url = format!("{}/2023/05/oporavak/", server.uri());
    let page = fetcher.fetch(&url).await.unwrap();

    assert_eq!(page.status, 200);
    assert_eq!(page.attempts, 2);
    assert!(page.text().contains("Sadržaj"));
}

#[tokio::test]
async fn test_retries_follow_backoff_schedule() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2023/05/spor/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.fetch.max_retries = 4;
    config.fetch.retry_delay = 0.1;
    config.fetch.backoff_factor = 2.0;
    config.fetch.max_backoff = 1.0;
    let fetcher = Fetcher::new(&config).unwrap();

    // 100ms + 200ms + 400ms between four attempts
    let started = Instant::now();
    let failure = fetcher
        .fetch(&format!("{}/2023/05/spor/", server.uri()))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(failure.attempts, 4);
    assert_eq!(requests_to(&server, "/2023/05/spor/").await, 4);
    assert!(elapsed >= Duration::from_millis(650), "too fast: {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1500), "too slow: {:?}", elapsed);
}
