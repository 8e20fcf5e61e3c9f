//! Per-project page parsing into a [`RepositoryDetail`].
//!
//! Everything here is best effort: a missing element yields an empty value or
//! a sentinel, never an error. The only failure is an invalid selector.

use chrono::DateTime;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::contract::{ContributorCount, RepositoryDetail, UNKNOWN};
use crate::error::DigestError;
use crate::listing::{collapse_whitespace, compile, element_text};

pub const UNKNOWN_REPOSITORY: &str = "unknown repository";
const EXCERPT_CHARS: usize = 200;
const FEATURES_PER_HEADING: usize = 3;
const MAX_FEATURES: usize = 5;

static UPDATED_ON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Updated\s+(\w+\s+\d+,\s+\d+)").expect("updated pattern compiles")
});
static COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:,\d{3})+|\d+").expect("count pattern compiles"));

/// Lowercase fragments that mark a README heading as a feature list.
const FEATURE_KEYWORDS: &[&str] = &[
    "feature",
    "功能",
    "特性",
    "특성",
    "fonctionnalit",
    "característica",
    "funcionalidad",
];

struct DetailSelectors {
    name_link: Selector,
    description: Selector,
    topics: Selector,
    labels: Selector,
    readme: Selector,
    headings: Selector,
    contributors: Selector,
    relative_time: Selector,
}

impl DetailSelectors {
    fn compile() -> Result<Self, DigestError> {
        Ok(Self {
            name_link: compile(r#"strong[itemprop="name"] a"#)?,
            description: compile(
                r#"p[data-testid="repo-header-description"], .BorderGrid-cell p.f4"#,
            )?,
            topics: compile(r#"a.topic-tag, a[data-octo-link-type="repository-topic"]"#)?,
            labels: compile(r#"span.Label, [data-testid^="label-"]"#)?,
            readme: compile("article")?,
            headings: compile("h2, h3")?,
            contributors: compile(r#"a[href*="/graphs/contributors"]"#)?,
            relative_time: compile("relative-time[datetime]")?,
        })
    }
}

/// Extracts detail fields from a project page. `page_url` is used for the
/// name fallback when the header cannot be read.
pub fn parse_repository_detail(
    html: &str,
    page_url: &str,
) -> Result<RepositoryDetail, DigestError> {
    let selectors = DetailSelectors::compile()?;
    let document = Html::parse_document(html);

    let (is_fork, is_mirror, is_archived) = label_flags(&document, &selectors.labels);
    let readme = document.select(&selectors.readme).next();

    Ok(RepositoryDetail {
        full_name: full_name(&document, &selectors.name_link, page_url),
        description: document
            .select(&selectors.description)
            .next()
            .map(element_text)
            .unwrap_or_default(),
        topics: topics(&document, &selectors.topics),
        is_fork,
        is_mirror,
        is_archived,
        readme_excerpt: readme.map(readme_excerpt).unwrap_or_default(),
        features: readme
            .map(|r| features(r, &selectors.headings))
            .unwrap_or_default(),
        last_updated: last_updated(&document, &selectors.relative_time),
        contributors: contributors(&document, &selectors.contributors),
    })
}

/// `owner/repo` from a project URL, if the path has at least two segments.
pub fn repo_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    Some(format!("{owner}/{repo}"))
}

fn full_name(document: &Html, selector: &Selector, page_url: &str) -> String {
    document
        .select(selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.trim_matches('/').to_string())
        .filter(|name| name.contains('/'))
        .or_else(|| repo_name_from_url(page_url))
        .unwrap_or_else(|| UNKNOWN_REPOSITORY.to_string())
}

fn topics(document: &Html, selector: &Selector) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    for topic in document.select(selector).map(element_text) {
        if !topic.is_empty() && !topics.contains(&topic) {
            topics.push(topic);
        }
    }
    topics
}

fn label_flags(document: &Html, selector: &Selector) -> (bool, bool, bool) {
    let labels: Vec<String> = document
        .select(selector)
        .map(|l| element_text(l).to_lowercase())
        .collect();
    let any = |needle: &str| labels.iter().any(|l| l.contains(needle));
    (any("fork"), any("mirror"), any("archive"))
}

fn readme_excerpt(readme: ElementRef<'_>) -> String {
    let text = element_text(readme);
    if text.is_empty() {
        return String::new();
    }
    let excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", excerpt.trim_end())
}

fn features(readme: ElementRef<'_>, headings: &Selector) -> Vec<String> {
    let mut features = Vec::new();
    for heading in readme.select(headings) {
        let title = element_text(heading).to_lowercase();
        if !FEATURE_KEYWORDS.iter().any(|k| title.contains(k)) {
            continue;
        }
        let Some(list) = following_list(heading) else {
            continue;
        };
        features.extend(
            list.children()
                .filter_map(ElementRef::wrap)
                .filter(|item| item.value().name() == "li")
                .map(element_text)
                .filter(|text| !text.is_empty())
                .take(FEATURES_PER_HEADING),
        );
        if features.len() >= MAX_FEATURES {
            break;
        }
    }
    features.truncate(MAX_FEATURES);
    features
}

/// The list element right after a heading. GitHub wraps rendered headings in
/// `div.markdown-heading`, in which case the list follows the wrapper.
fn following_list(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let anchor = match heading.parent().and_then(ElementRef::wrap) {
        Some(parent) if parent.value().classes().any(|c| c == "markdown-heading") => parent,
        _ => heading,
    };
    anchor
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .filter(|el| matches!(el.value().name(), "ul" | "ol"))
}

fn last_updated(document: &Html, relative_time: &Selector) -> String {
    if let Some(raw) = document
        .select(relative_time)
        .next()
        .and_then(|el| el.value().attr("datetime"))
    {
        return match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(ts) => ts.format("%Y-%m-%d").to_string(),
            Err(_) => raw.trim().to_string(),
        };
    }

    let body = collapse_whitespace(&document.root_element().text().collect::<String>());
    UPDATED_ON
        .captures(&body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn contributors(document: &Html, selector: &Selector) -> ContributorCount {
    document
        .select(selector)
        .map(element_text)
        .find_map(|text| {
            COUNT
                .find(&text)
                .and_then(|m| m.as_str().replace(',', "").parse::<u32>().ok())
        })
        .map(ContributorCount::Known)
        .unwrap_or(ContributorCount::Unknown)
}
