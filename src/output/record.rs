//! Corpus text records
//!
//! Every article in the corpus is framed the same way:
//!
//! ```text
//! <***>
//! NOVINA: poskok.info
//! DATUM: 14.05.2023
//! RUBRIKA: Politika
//! NADNASLOV: N/A
//! NASLOV: Vlada donijela odluku
//! PODNASLOV: N/A
//! STRANA: https://poskok.info/2023/05/vlada-odluka/
//! AUTOR(I): Ivana Horvat
//!
//! Prvi odlomak.
//!
//! ```
//!
//! Header values are single-line, empty values are written as `N/A`, and a
//! body can never contain the separator.

use crate::model::ArticleRecord;

pub const RECORD_SEPARATOR: &str = "<***>";

/// Header labels in record order
pub const FIELD_LABELS: [&str; 8] = [
    "NOVINA",
    "DATUM",
    "RUBRIKA",
    "NADNASLOV",
    "NASLOV",
    "PODNASLOV",
    "STRANA",
    "AUTOR(I)",
];

const MISSING: &str = "N/A";

/// Renders one article as a corpus record
pub fn format_record(article: &ArticleRecord, source_name: &str) -> String {
    let values = [
        header_value(source_name),
        header_value(&article.date.display()),
        header_value(&article.rubrika),
        header_value(article.overline.as_deref().unwrap_or_default()),
        header_value(&article.title),
        header_value(article.subtitle.as_deref().unwrap_or_default()),
        header_value(&article.url),
        header_value(&article.author),
    ];

    let mut record = String::with_capacity(article.body.len() + 256);
    record.push_str(RECORD_SEPARATOR);
    record.push('\n');
    for (label, value) in FIELD_LABELS.iter().zip(values.iter()) {
        record.push_str(label);
        record.push_str(": ");
        record.push_str(value);
        record.push('\n');
    }
    record.push('\n');
    record.push_str(&tidy_body(&article.body));
    record.push_str("\n\n");
    record
}

/// Collapses a header value to one line, `N/A` when empty
pub fn header_value(value: &str) -> String {
    let line = value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(RECORD_SEPARATOR, "<**>");
    if line.is_empty() {
        MISSING.to_string()
    } else {
        line
    }
}

/// Normalises body text for the corpus
///
/// Line endings become `\n`, trailing spaces are dropped, runs of blank
/// lines collapse to a single blank line, and a literal separator is
/// defused.
pub fn tidy_body(body: &str) -> String {
    let normalized = body.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(normalized.len());
    let mut blank_run = 0;
    for line in normalized.lines().map(str::trim_end) {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }

    let out = out.replace(RECORD_SEPARATOR, "<**>");
    if out.is_empty() {
        MISSING.to_string()
    } else {
        out
    }
}

/// Renders a sequence of articles back to back
pub fn format_records<'a>(
    articles: impl IntoIterator<Item = &'a ArticleRecord>,
    source_name: &str,
) -> String {
    articles
        .into_iter()
        .map(|article| format_record(article, source_name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::article;

    #[test]
    fn test_record_layout() {
        let mut a = article("https://poskok.info/2023/05/vijest/", "Prvi odlomak.\n\nDrugi.");
        a.title = "Vlada\ndonijela   odluku".to_string();
        a.subtitle = Some(String::new());

        let record = format_record(&a, "poskok.info");
        let expected = "<***>\n\
NOVINA: poskok.info\n\
DATUM: 14.05.2023\n\
RUBRIKA: Sport\n\
NADNASLOV: N/A\n\
NASLOV: Vlada donijela odluku\n\
PODNASLOV: N/A\n\
STRANA: https://poskok.info/2023/05/vijest/\n\
AUTOR(I): Uredništvo\n\
\n\
Prvi odlomak.\n\
\n\
Drugi.\n\
\n";
        assert_eq!(record, expected);
    }

    #[test]
    fn test_tidy_body_collapses_blank_runs() {
        assert_eq!(tidy_body("a  \r\n\r\n\r\n\n b\n\n\nc\n"), "a\n\n b\n\nc");
        assert_eq!(tidy_body("a\nb"), "a\nb");
        assert_eq!(tidy_body(" \n\n "), "N/A");
    }

    #[test]
    fn test_separator_is_defused() {
        let a = article("https://a.hr/1/", "prije <***> poslije");
        let record = format_record(&a, "<***>");
        assert_eq!(record.matches(RECORD_SEPARATOR).count(), 1);
        assert!(record.contains("prije <**> poslije"));
    }

    #[test]
    fn test_split_yields_one_block_per_record() {
        let articles = vec![
            article("https://a.hr/1/", "jedan"),
            article("https://a.hr/2/", "dva\n\n\n\ntri"),
        ];
        let corpus = format_records(&articles, "poskok.info");
        let blocks: Vec<&str> = corpus
            .split(RECORD_SEPARATOR)
            .filter(|b| !b.trim().is_empty())
            .collect();
        assert_eq!(blocks.len(), 2);

        for block in blocks {
            let labels: Vec<&str> = block
                .trim_start()
                .lines()
                .take(8)
                .map(|line| line.split(": ").next().unwrap())
                .collect();
            assert_eq!(labels, FIELD_LABELS);
        }
    }
}
