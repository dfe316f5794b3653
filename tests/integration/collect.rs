//! Link collection against a paginated mock category

use crate::common::{listing_path, local_body, mount_site, requests_to};
use novina::crawler::FailedPage;
use novina::pipeline::Pipeline;
use novina::storage::{read_json, LinkBatchStore};
use novina::BatchStatus;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn bodies(n: usize) -> Vec<String> {
    (1..=n).map(local_body).collect()
}

#[tokio::test]
async fn test_pagination_stops_at_empty_page() {
    let site = mount_site(&[5, 5], &bodies(10)).await;
    let mut pipeline = Pipeline::new(site.config.clone(), "test").unwrap();

    let outcome = pipeline.collect(false).await.unwrap();

    assert_eq!(outcome.new_links, 10);
    assert_eq!(outcome.sealed, vec![1, 2, 3]);
    let counts: Vec<usize> = outcome.index.batches.iter().map(|b| b.count).collect();
    assert_eq!(counts, vec![4, 4, 2]);
    assert!(outcome
        .index
        .batches
        .iter()
        .all(|b| b.status == BatchStatus::Pending));

    assert_eq!(requests_to(&site.server, &listing_path(3)).await, 1);
    assert_eq!(requests_to(&site.server, &listing_path(4)).await, 0);

    let store = LinkBatchStore::new(pipeline.layout().links_dir());
    let first = store.load_batch(1).unwrap();
    assert!(first.links[0].url.ends_with("/2023/05/clanak-1/"));
    assert_eq!(first.links[0].category, "Vijesti");
    assert_eq!(first.links[0].year, Some(2023));
    assert_eq!(first.links[0].discovered_at_page, 1);
}

#[tokio::test]
async fn test_rerun_only_adds_new_links() {
    let site = mount_site(&[5, 5], &bodies(10)).await;
    let mut pipeline = Pipeline::new(site.config.clone(), "test").unwrap();
    pipeline.collect(false).await.unwrap();

    let again = pipeline.collect(false).await.unwrap();
    assert_eq!(again.new_links, 0);
    assert!(again.sealed.is_empty());
    assert_eq!(again.index.batches.len(), 3);
    assert_eq!(again.index.total_links, 10);

    let fresh = pipeline.collect(true).await.unwrap();
    assert_eq!(fresh.new_links, 10);
    assert_eq!(fresh.sealed, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_failed_listing_page_is_recorded_and_skipped() {
    let site = mount_site(&[5, 3], &bodies(8)).await;
    // Page 3 would be the empty end-of-listing page; fail it instead
    Mock::given(method("GET"))
        .and(path(listing_path(3)))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&site.server)
        .await;
    Mock::given(method("GET"))
        .and(path(listing_path(4)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&site.server)
        .await;

    let mut pipeline = Pipeline::new(site.config.clone(), "test").unwrap();
    let outcome = pipeline.collect(false).await.unwrap();

    assert_eq!(outcome.new_links, 8);
    assert_eq!(outcome.failed_pages, 1);
    assert_eq!(requests_to(&site.server, &listing_path(3)).await, 3);
    assert_eq!(requests_to(&site.server, &listing_path(4)).await, 1);

    let failed: Vec<FailedPage> = read_json(&pipeline.layout().failed_pages_path())
        .unwrap()
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].page, 3);
    assert_eq!(failed[0].category, "Vijesti");
}

#[tokio::test]
async fn test_robots_disallowed_links_are_skipped() {
    let site = mount_site(&[3], &bodies(3)).await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /2023/05/clanak-2/"),
        )
        .mount(&site.server)
        .await;

    let mut pipeline = Pipeline::new(site.config.clone(), "test").unwrap();
    let outcome = pipeline.collect(false).await.unwrap();

    assert_eq!(outcome.new_links, 2);
    let store = LinkBatchStore::new(pipeline.layout().links_dir());
    let urls: Vec<String> = store
        .load_batch(1)
        .unwrap()
        .links
        .into_iter()
        .map(|l| l.url)
        .collect();
    assert!(urls.iter().all(|u| !u.contains("clanak-2")));
}
