//! Markdown report generation
//!
//! This module renders the run report as a human-readable markdown summary:
//! totals per stage, per-batch progress, per-category counts, and every
//! terminal failure by URL and reason.

use crate::output::report::RunReport;
use crate::output::OutputResult;
use crate::storage::write_atomic;
use std::path::Path;

/// Failures listed before the table is truncated
const MAX_LISTED_FAILURES: usize = 200;

/// Writes the markdown rendering of a report
///
/// # Arguments
///
/// * `report` - The run report
/// * `output_path` - Path where the markdown file should be written
pub fn write_markdown_report(report: &RunReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);
    write_atomic(output_path, markdown.as_bytes())?;
    Ok(())
}

/// Formats a run report as markdown
pub fn format_markdown_report(report: &RunReport) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Harvest Report: {}\n\n", report.source));

    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Generated**: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("- **Config Hash**: {}\n", report.config_hash));
    md.push_str(&format!(
        "- **Corpus Size**: {} bytes ({:.2} MiB)\n\n",
        report.output_bytes,
        report.output_bytes as f64 / (1024.0 * 1024.0)
    ));

    md.push_str("## Totals\n\n");
    md.push_str("| Stage | Count |\n");
    md.push_str("|-------|-------|\n");
    md.push_str(&format!("| Links collected | {} |\n", report.links_collected));
    md.push_str(&format!("| Links processed | {} |\n", report.links_processed));
    md.push_str(&format!(
        "| Articles extracted | {} |\n",
        report.articles_extracted
    ));
    md.push_str(&format!("| Failed | {} |\n", report.links_failed));
    md.push_str(&format!(
        "| Soft-rejected | {} |\n",
        report.links_soft_rejected
    ));
    md.push_str(&format!("| Local | {} |\n", report.articles_local));
    md.push_str(&format!("| Foreign | {} |\n", report.articles_foreign));
    md.push_str(&format!("| Mixed (kept) | {} |\n", report.articles_mixed));
    md.push_str(&format!(
        "| Duplicates removed | {} |\n",
        report.duplicates_removed
    ));
    md.push_str(&format!("| Final articles | {} |\n\n", report.final_articles));

    if !report.per_category.is_empty() {
        md.push_str("## Articles per Category\n\n");
        md.push_str("| Category | Articles |\n");
        md.push_str("|----------|----------|\n");
        for (category, count) in &report.per_category {
            md.push_str(&format!("| {} | {} |\n", escape_cell(category), count));
        }
        md.push('\n');
    }

    if !report.batches.is_empty() {
        md.push_str("## Batches\n\n");
        md.push_str("| Batch | Status | Links | Succeeded | Failed | Soft-rejected |\n");
        md.push_str("|-------|--------|-------|-----------|--------|---------------|\n");
        for batch in &report.batches {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                batch.id, batch.status, batch.links, batch.succeeded, batch.failed, batch.soft_rejected
            ));
        }
        md.push('\n');
    }

    if !report.failures.is_empty() {
        md.push_str("## Failed Links\n\n");
        md.push_str("| URL | Reason | Attempts |\n");
        md.push_str("|-----|--------|----------|\n");
        for failure in report.failures.iter().take(MAX_LISTED_FAILURES) {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                failure.url,
                escape_cell(&failure.reason),
                failure.attempts
            ));
        }
        if report.failures.len() > MAX_LISTED_FAILURES {
            md.push_str(&format!(
                "\n... and {} more (see the JSON report)\n",
                report.failures.len() - MAX_LISTED_FAILURES
            ));
        }
        md.push('\n');
    }

    if !report.failed_listing_pages.is_empty() {
        md.push_str("## Failed Listing Pages\n\n");
        for page in &report.failed_listing_pages {
            md.push_str(&format!(
                "- {} (page {}): {}\n",
                page.url, page.page, page.error
            ));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
