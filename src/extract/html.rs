//! Selector-driven extraction for WordPress-style news pages

use crate::crawler::collapse_whitespace;
use crate::extract::date::parse_date;
use crate::extract::{ArticleParser, ParseError};
use crate::model::{ArticleDate, ArticleRecord};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

const TITLE_SELECTORS: &[&str] = &[
    "h1.entry-title",
    "h1.post-title",
    "h1.td-post-title",
    "h1.tdb-title-text",
    "h1.single-post-title",
    "h1.article-title",
    "article h1",
    ".post-header h1",
    "#main h1",
    "h1",
];

const DATE_SELECTORS: &[&str] = &[
    "time[datetime]",
    "time.entry-date",
    "time.published",
    "span.entry-date",
    "span.post-date",
    "span.td-post-date",
    ".meta-date",
    ".post-date",
    ".published",
    r#"meta[property="article:published_time"]"#,
    r#"meta[itemprop="datePublished"]"#,
];

const AUTHOR_SELECTORS: &[&str] = &[
    r#"meta[name="author"]"#,
    r#"meta[property="article:author"]"#,
    ".author-name",
    ".post-author",
    ".entry-author",
    "span.author",
    r#"a[rel="author"]"#,
    ".byline .author",
    ".post-meta .author",
];

const SECTION_SELECTORS: &[&str] = &[
    r#"meta[property="article:section"]"#,
    ".category-name",
    ".post-category",
    ".entry-category",
    "span.category",
    r#"a[rel~="category"]"#,
    ".post-meta .category",
    ".breadcrumbs a:nth-of-type(2)",
];

const SUBTITLE_SELECTORS: &[&str] = &[
    ".post-subtitle",
    ".entry-subtitle",
    ".article-subtitle",
    ".td-post-sub-title",
    ".jeg_post_subtitle",
    ".excerpt",
    ".lead",
    "h2.subtitle",
    r#"meta[property="og:description"]"#,
    r#"meta[name="description"]"#,
];

const OVERLINE_SELECTORS: &[&str] = &[".nadnaslov", ".overline", ".kicker", ".post-overline"];

const CONTENT_SELECTORS: &[&str] = &[
    "div.td-post-content",
    "div.entry-content",
    "div.post-content",
    "div.article-content",
    "div.content-inner",
    "article .content",
    ".post-body",
    ".article-body",
    "#article-content",
    r#"div[itemprop="articleBody"]"#,
];

const FALLBACK_CONTENT_SELECTORS: &[&str] =
    &["article", "#main", "#content", ".main-content", ".content-area"];

const BODY_BLOCKS: &str = "p, h2, h3, h4, blockquote, li";

/// Paragraphs starting with these are page furniture, not article text
const SKIPPED_BLOCK_PREFIXES: &[&str] = &["oglas", "advertisement", "share this", "pratite nas"];

/// Fallback body text is cut at the first of these
const STOP_PHRASES: &[&str] = &[
    "Pratite nas na",
    "Sva prava zadržana",
    "Copyright",
    "All rights reserved",
    "OGLAS",
    "Oglas",
];

/// Subtitles must be longer than this...
const SUBTITLE_MIN_CHARS: usize = 20;
/// ...and shorter than this
const SUBTITLE_MAX_CHARS: usize = 300;

const FALLBACK_MIN_CHARS: usize = 100;

/// Extracts articles with ordered selector fallbacks
///
/// Each field tries its selectors in order and takes the first non-empty
/// match. Meta tags contribute their `content` attribute, other elements
/// their text.
pub struct HtmlArticleParser {
    source_name: String,
    title: Vec<Selector>,
    og_title: Vec<Selector>,
    page_title: Vec<Selector>,
    date: Vec<Selector>,
    author: Vec<Selector>,
    section: Vec<Selector>,
    subtitle: Vec<Selector>,
    overline: Vec<Selector>,
    content: Vec<Selector>,
    fallback_content: Vec<Selector>,
    blocks: Vec<Selector>,
    meta: Vec<Selector>,
}

fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter().filter_map(|s| Selector::parse(s).ok()).collect()
}

impl HtmlArticleParser {
    /// `source_name` is the fallback author when a page names none
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            title: selectors(TITLE_SELECTORS),
            og_title: selectors(&[r#"meta[property="og:title"]"#]),
            page_title: selectors(&["title"]),
            date: selectors(DATE_SELECTORS),
            author: selectors(AUTHOR_SELECTORS),
            section: selectors(SECTION_SELECTORS),
            subtitle: selectors(SUBTITLE_SELECTORS),
            overline: selectors(OVERLINE_SELECTORS),
            content: selectors(CONTENT_SELECTORS),
            fallback_content: selectors(FALLBACK_CONTENT_SELECTORS),
            blocks: selectors(&[BODY_BLOCKS]),
            meta: selectors(&["meta"]),
        }
    }

    fn extract_title(&self, document: &Html, url: &str) -> String {
        if let Some(title) = first_value(document, &self.title) {
            return title;
        }
        if let Some(title) = first_value(document, &self.og_title) {
            return title;
        }
        if let Some(title) = first_value(document, &self.page_title) {
            let cut = title
                .split('|')
                .next()
                .and_then(|t| t.split(" - ").next())
                .unwrap_or(title.as_str())
                .trim()
                .to_string();
            if !cut.is_empty() {
                return cut;
            }
        }
        title_from_slug(url)
    }

    fn extract_date(&self, document: &Html, url: &str) -> ArticleDate {
        for selector in &self.date {
            for element in document.select(selector) {
                let value = element
                    .value()
                    .attr("datetime")
                    .or_else(|| element.value().attr("content"))
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| element_text(&element));
                if !value.is_empty() {
                    return parse_date(&value);
                }
            }
        }
        date_from_url(url).unwrap_or_default()
    }

    fn extract_author(&self, document: &Html) -> String {
        for selector in &self.author {
            for element in document.select(selector) {
                let raw = element
                    .value()
                    .attr("content")
                    .map(collapse_whitespace)
                    .unwrap_or_else(|| element_text(&element));
                let name = strip_byline_prefix(&raw);
                if !name.is_empty() && !self.is_source_name(name) {
                    return name.to_string();
                }
            }
        }
        self.source_name.clone()
    }

    fn is_source_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        let source = self.source_name.to_lowercase();
        name == source || source.split('.').next() == Some(name.as_str())
    }

    fn extract_subtitle(&self, document: &Html) -> Option<String> {
        for selector in &self.subtitle {
            for element in document.select(selector) {
                let text = element_value(&element);
                let chars = text.chars().count();
                if chars > SUBTITLE_MIN_CHARS && chars < SUBTITLE_MAX_CHARS {
                    return Some(text);
                }
            }
        }
        None
    }

    fn extract_body(&self, document: &Html) -> Option<String> {
        for selector in &self.content {
            let Some(container) = document.select(selector).next() else {
                continue;
            };
            let paragraphs = self.body_blocks(&container);
            if !paragraphs.is_empty() {
                return Some(paragraphs.join("\n\n"));
            }
        }
        self.fallback_body(document)
    }

    fn body_blocks(&self, container: &ElementRef) -> Vec<String> {
        let mut paragraphs = Vec::new();
        for selector in &self.blocks {
            for block in container.select(selector) {
                if nested_in_block(&block, container) {
                    continue;
                }
                let text = element_text(&block);
                if text.is_empty() {
                    continue;
                }
                let lower = text.to_lowercase();
                if SKIPPED_BLOCK_PREFIXES.iter().any(|p| lower.starts_with(p)) {
                    continue;
                }
                paragraphs.push(text);
            }
        }
        paragraphs
    }

    /// Whole-container text for pages without a recognised body element
    fn fallback_body(&self, document: &Html) -> Option<String> {
        let container = self
            .fallback_content
            .iter()
            .find_map(|selector| document.select(selector).next())?;

        let mut text = collapse_whitespace(&visible_text(&container));
        for phrase in STOP_PHRASES {
            if let Some(pos) = text.find(phrase) {
                text.truncate(pos);
            }
        }
        let text = text.trim().to_string();
        (text.chars().count() > FALLBACK_MIN_CHARS).then_some(text)
    }

    fn extract_metadata(&self, document: &Html) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        for selector in &self.meta {
            for meta in document.select(selector) {
                let element = meta.value();
                let Some(key) = element.attr("property").or_else(|| element.attr("name")) else {
                    continue;
                };
                metadata.insert(
                    key.to_string(),
                    element.attr("content").unwrap_or_default().to_string(),
                );
            }
        }
        metadata
    }
}

impl ArticleParser for HtmlArticleParser {
    fn parse(&self, url: &str, html: &[u8]) -> Result<ArticleRecord, ParseError> {
        let text = String::from_utf8_lossy(html);
        let document = Html::parse_document(&text);

        let body = self
            .extract_body(&document)
            .ok_or_else(|| ParseError::new("no article body found"))?;

        Ok(ArticleRecord {
            url: url.to_string(),
            title: self.extract_title(&document, url),
            overline: first_value(&document, &self.overline),
            subtitle: self.extract_subtitle(&document),
            rubrika: first_value(&document, &self.section).unwrap_or_default(),
            date: self.extract_date(&document, url),
            author: self.extract_author(&document),
            body,
            raw_metadata: self.extract_metadata(&document),
        })
    }
}

/// First non-empty value over an ordered selector list
fn first_value(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        document
            .select(selector)
            .map(|element| element_value(&element))
            .find(|value| !value.is_empty())
    })
}

/// `content` attribute for meta tags, whitespace-collapsed text otherwise
fn element_value(element: &ElementRef) -> String {
    match element.value().attr("content") {
        Some(content) => collapse_whitespace(content),
        None => element_text(element),
    }
}

fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Text nodes outside `<script>` and `<style>`
fn visible_text(element: &ElementRef) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
            .is_some_and(|name| name == "script" || name == "style");
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

/// True when a block sits inside another body block of the same container
fn nested_in_block(block: &ElementRef, container: &ElementRef) -> bool {
    for ancestor in block.ancestors() {
        if ancestor.id() == container.id() {
            return false;
        }
        if let Some(element) = ancestor.value().as_element() {
            if matches!(element.name(), "p" | "blockquote" | "li") {
                return true;
            }
        }
    }
    false
}

fn strip_byline_prefix(author: &str) -> &str {
    let trimmed = author.trim();
    let lower = trimmed.to_lowercase();
    for prefix in ["by", "autor", "piše"] {
        if !lower.starts_with(prefix) {
            continue;
        }
        if let Some(rest) = trimmed.get(prefix.len()..) {
            if rest.starts_with(|c: char| c == ':' || c.is_whitespace()) {
                return rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace());
            }
        }
    }
    trimmed
}

/// `/2023/05/14/slug/` style URLs carry the publication date
fn date_from_url(url: &str) -> Option<ArticleDate> {
    let parsed = url::Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.collect();
    segments.windows(3).find_map(|w| {
        if w[0].len() != 4 || w[1].len() != 2 || w[2].len() != 2 {
            return None;
        }
        let date = parse_date(&format!("{}-{}-{}", w[0], w[1], w[2]));
        date.iso.is_some().then_some(date)
    })
}

fn title_from_slug(url: &str) -> String {
    let slug = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
