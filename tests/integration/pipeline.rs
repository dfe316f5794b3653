//! Full pipeline runs: collect, process, filter, combine

use crate::common::{article_path, english_body, local_body, mount_site, requests_to, TestSite};
use novina::output::{RunReport, FIELD_LABELS, RECORD_SEPARATOR};
use novina::pipeline::{parse_batch_range, Pipeline};
use novina::storage::{CheckpointStore, FileCheckpointStore};
use novina::{BatchStatus, HarvestError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Ten local articles; article 10 repeats the body of article 5
async fn site_with_duplicate() -> TestSite {
    let mut bodies: Vec<String> = (1..=10).map(local_body).collect();
    bodies[9] = bodies[4].clone();
    mount_site(&[5, 5], &bodies).await
}

fn read_corpus(site: &TestSite, pipeline: &Pipeline) -> String {
    let path = pipeline
        .layout()
        .final_dir()
        .join(&site.config.output.corpus_file);
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_full_run_deduplicates_corpus() {
    let site = site_with_duplicate().await;
    let mut pipeline = Pipeline::new(site.config.clone(), "test").unwrap();

    let report = pipeline.run(false).await.unwrap();

    assert_eq!(report.links_collected, 10);
    assert_eq!(report.articles_extracted, 10);
    assert_eq!(report.articles_local, 10);
    assert_eq!(report.articles_foreign, 0);
    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.final_articles, 9);
    assert_eq!(report.batches.len(), 3);
    assert!(report
        .batches
        .iter()
        .all(|b| b.status == BatchStatus::Completed));

    let corpus = read_corpus(&site, &pipeline);
    assert_eq!(corpus.matches(RECORD_SEPARATOR).count(), 9);
    for label in FIELD_LABELS {
        assert_eq!(corpus.matches(&format!("\n{}: ", label)).count(), 9, "{}", label);
    }
    assert!(corpus.starts_with(&format!("{}\nNOVINA: novina-test\n", RECORD_SEPARATOR)));
    assert!(corpus.contains("NASLOV: Clanak 1\n"));
    assert!(corpus.contains("RUBRIKA: Vijesti\n"));
    assert!(corpus.contains("AUTOR(I): Ivana Horvat\n"));
    assert!(!corpus.contains("/2023/05/clanak-10/"));

    assert!(pipeline.layout().report_json_path().exists());
    let markdown = std::fs::read_to_string(pipeline.layout().report_markdown_path()).unwrap();
    assert!(markdown.contains("| Duplicates removed | 1 |"));
}

#[tokio::test]
async fn test_rerun_skips_completed_batches() {
    let site = site_with_duplicate().await;
    let mut pipeline = Pipeline::new(site.config.clone(), "test").unwrap();
    pipeline.run(false).await.unwrap();
    let first = read_corpus(&site, &pipeline);

    let mut again = Pipeline::new(site.config.clone(), "test").unwrap();
    let reports = again.process(None).await.unwrap();
    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.skipped && r.processed_now == 0));

    again.filter().unwrap();
    again.combine().unwrap();
    assert_eq!(read_corpus(&site, &again), first);

    for n in 1..=10 {
        assert_eq!(requests_to(&site.server, &article_path(n)).await, 1);
    }
}

#[tokio::test]
async fn test_resume_processes_only_links_past_watermark() {
    let site = site_with_duplicate().await;
    let mut pipeline = Pipeline::new(site.config.clone(), "test").unwrap();
    pipeline.collect(false).await.unwrap();
    let only_first = parse_batch_range("1").unwrap();
    pipeline.process(Some(&only_first)).await.unwrap();

    // Roll batch 1 back as if the run had stopped after two links
    let checkpoints = FileCheckpointStore::new(pipeline.layout().checkpoints_dir()).unwrap();
    let mut checkpoint = checkpoints.load(1).unwrap().unwrap();
    checkpoint.status = BatchStatus::InProgress;
    checkpoint.last_processed_index = 2;
    checkpoint.processed_count = 2;
    checkpoints.save(&checkpoint).unwrap();

    let reports = pipeline.process(Some(&only_first)).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, BatchStatus::Completed);
    assert_eq!(reports[0].processed_now, 2);
    assert_eq!(reports[0].succeeded, 4);

    assert_eq!(requests_to(&site.server, &article_path(1)).await, 1);
    assert_eq!(requests_to(&site.server, &article_path(2)).await, 1);
    assert_eq!(requests_to(&site.server, &article_path(3)).await, 2);
    assert_eq!(requests_to(&site.server, &article_path(4)).await, 2);
    assert_eq!(requests_to(&site.server, &article_path(5)).await, 0);

    let status = pipeline.status().unwrap();
    assert_eq!(status.len(), 3);
    assert_eq!(status[0].status, BatchStatus::Completed);
    assert_eq!(status[0].watermark, 4);
    assert_eq!(status[1].status, BatchStatus::Pending);
}

#[tokio::test]
async fn test_foreign_and_short_articles_are_left_out() {
    let bodies = vec![
        local_body(1),
        english_body(),
        "Prekratko.".to_string(),
        local_body(4),
    ];
    let site = mount_site(&[4], &bodies).await;
    let mut pipeline = Pipeline::new(site.config.clone(), "test").unwrap();

    let report = pipeline.run(false).await.unwrap();

    assert_eq!(report.articles_extracted, 3);
    assert_eq!(report.links_soft_rejected, 1);
    assert_eq!(report.articles_local, 2);
    assert_eq!(report.articles_foreign, 1);
    assert_eq!(report.final_articles, 2);

    let corpus = read_corpus(&site, &pipeline);
    assert!(!corpus.contains("The government"));
    assert!(!corpus.contains("Prekratko"));
}

/// Requests per article after a restart of batch 1 only
async fn assert_only_first_batch_refetched(site: &TestSite) {
    for n in 1..=4 {
        assert_eq!(requests_to(&site.server, &article_path(n)).await, 2, "article {}", n);
    }
    for n in 5..=10 {
        assert_eq!(requests_to(&site.server, &article_path(n)).await, 1, "article {}", n);
    }
}

#[tokio::test]
async fn test_corrupt_checkpoint_restarts_batch() {
    let site = site_with_duplicate().await;
    let mut pipeline = Pipeline::new(site.config.clone(), "test").unwrap();
    pipeline.run(false).await.unwrap();

    let checkpoint_file = pipeline
        .layout()
        .checkpoints_dir()
        .join("checkpoint_batch_0001.json");
    assert!(checkpoint_file.exists());
    std::fs::write(&checkpoint_file, "{ not json").unwrap();

    let reports = pipeline.process(None).await.unwrap();
    assert_eq!(reports.len(), 3);
    assert!(!reports[0].skipped);
    assert_eq!(reports[0].status, BatchStatus::Completed);
    assert_eq!(reports[0].processed_now, 4);
    assert_eq!(reports[0].succeeded, 4);
    assert!(reports[1].skipped && reports[2].skipped);

    assert_only_first_batch_refetched(&site).await;
}

#[tokio::test]
async fn test_checkpoint_for_other_batch_contents_restarts_batch() {
    let site = site_with_duplicate().await;
    let mut pipeline = Pipeline::new(site.config.clone(), "test").unwrap();
    pipeline.run(false).await.unwrap();

    let checkpoints = FileCheckpointStore::new(pipeline.layout().checkpoints_dir()).unwrap();
    let mut checkpoint = checkpoints.load(1).unwrap().unwrap();
    checkpoint.batch_digest = "0".repeat(64);
    checkpoints.save(&checkpoint).unwrap();

    let reports = pipeline.process(None).await.unwrap();
    assert!(!reports[0].skipped);
    assert_eq!(reports[0].processed_now, 4);
    assert!(reports[1].skipped && reports[2].skipped);

    let restored = checkpoints.load(1).unwrap().unwrap();
    assert_ne!(restored.batch_digest, "0".repeat(64));
    assert_eq!(restored.status, BatchStatus::Completed);

    assert_only_first_batch_refetched(&site).await;
}

#[tokio::test]
async fn test_missing_article_file_restarts_batch() {
    let site = site_with_duplicate().await;
    let mut pipeline = Pipeline::new(site.config.clone(), "test").unwrap();
    pipeline.run(false).await.unwrap();

    let checkpoints = FileCheckpointStore::new(pipeline.layout().checkpoints_dir()).unwrap();
    let mut checkpoint = checkpoints.load(1).unwrap().unwrap();
    checkpoint.status = BatchStatus::InProgress;
    checkpoint.last_processed_index = 2;
    checkpoint.processed_count = 2;
    checkpoints.save(&checkpoint).unwrap();
    std::fs::remove_file(
        pipeline
            .layout()
            .articles_dir()
            .join("articles_batch_0001.json"),
    )
    .unwrap();

    let reports = pipeline.process(None).await.unwrap();
    assert_eq!(reports[0].processed_now, 4);
    assert_eq!(reports[0].succeeded, 4);

    assert_only_first_batch_refetched(&site).await;
}

#[tokio::test]
async fn test_interrupted_run_still_writes_report() {
    let site = site_with_duplicate().await;
    Mock::given(method("GET"))
        .and(path(article_path(2)))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .mount(&site.server)
        .await;

    let stop = Arc::new(AtomicBool::new(false));
    let mut pipeline = Pipeline::new(site.config.clone(), "test")
        .unwrap()
        .with_stop_flag(Arc::clone(&stop));
    pipeline.collect(false).await.unwrap();
    pipeline
        .process(Some(&parse_batch_range("1").unwrap()))
        .await
        .unwrap();

    stop.store(true, Ordering::SeqCst);
    let err = pipeline.run(false).await.unwrap_err();
    assert!(matches!(err, HarvestError::Cancelled));

    let json_path = pipeline.layout().report_json_path();
    assert!(json_path.exists());
    assert!(pipeline.layout().report_markdown_path().exists());

    let report: RunReport =
        serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(report.links_collected, 10);
    assert_eq!(report.final_articles, 0);
    assert_eq!(report.batches.len(), 1);
    assert_eq!(report.batches[0].succeeded, 3);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].url.ends_with(&article_path(2)));

    assert!(!pipeline
        .layout()
        .final_dir()
        .join(&site.config.output.corpus_file)
        .exists());
}
