//! Publication date parsing
//!
//! Sites print dates in many shapes: ISO timestamps in `<time datetime>`
//! and meta tags, numeric `dd.mm.yyyy`, and Croatian long form such as
//! `14. svibnja 2023.`. Anything unrecognised is kept verbatim.

use crate::model::ArticleDate;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Genitive and nominative Croatian month names
const CROATIAN_MONTHS: &[(&str, u32)] = &[
    ("siječnja", 1),
    ("siječanj", 1),
    ("veljače", 2),
    ("veljača", 2),
    ("ožujka", 3),
    ("ožujak", 3),
    ("travnja", 4),
    ("travanj", 4),
    ("svibnja", 5),
    ("svibanj", 5),
    ("lipnja", 6),
    ("lipanj", 6),
    ("srpnja", 7),
    ("srpanj", 7),
    ("kolovoza", 8),
    ("kolovoz", 8),
    ("rujna", 9),
    ("rujan", 9),
    ("listopada", 10),
    ("listopad", 10),
    ("studenoga", 11),
    ("studenog", 11),
    ("studeni", 11),
    ("prosinca", 12),
    ("prosinac", 12),
];

const NUMERIC_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d. %m. %Y", "%d/%m/%Y"];

/// Parses a date string, keeping the original text either way
pub fn parse_date(text: &str) -> ArticleDate {
    let original = text.trim().to_string();
    ArticleDate {
        iso: parse_naive(&original),
        original,
    }
}

fn parse_naive(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    let trimmed = text.trim_end_matches('.');
    for format in NUMERIC_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    parse_croatian(text)
}

/// `14. svibnja 2023.`, `Objavljeno: 3 studenog 2019 u 10:15`
fn parse_croatian(text: &str) -> Option<NaiveDate> {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    for (i, token) in tokens.iter().enumerate() {
        let word = token.trim_end_matches('.');
        let Some(&(_, month)) = CROATIAN_MONTHS.iter().find(|(name, _)| *name == word) else {
            continue;
        };

        let day = i
            .checked_sub(1)
            .and_then(|j| tokens[j].trim_end_matches('.').parse::<u32>().ok())?;
        let year = tokens[i + 1..]
            .iter()
            .map(|t| t.trim_end_matches('.'))
            .find(|t| t.len() == 4 && t.chars().all(|c| c.is_ascii_digit()))?
            .parse::<i32>()
            .ok()?;

        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}
