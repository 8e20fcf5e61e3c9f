//! Trending listing: fetch, parse, validate and normalise project rows.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ListingConfig, ListingSelectors};
use crate::contract::{
    PageFetcher, ProjectRecord, NO_DESCRIPTION, UNKNOWN_PROJECT, UNSPECIFIED_LANGUAGE, ZERO_STARS,
};
use crate::error::DigestError;

/// Fetches the listing page and returns its rows in page order.
///
/// An empty page yields an empty `Vec`; deciding that emptiness is fatal is
/// left to the caller.
pub async fn fetch_listing<F>(
    fetcher: &F,
    config: &ListingConfig,
) -> Result<Vec<ProjectRecord>, DigestError>
where
    F: PageFetcher + ?Sized,
{
    let url = config.listing_url();
    info!(url = %url, timeout_ms = config.timeout_ms, "[LISTING] Fetching trending page");

    let html = fetcher.fetch_page(&url, config.timeout()).await.map_err(|e| {
        warn!(url = %url, error = %e, "[LISTING] Fetch failed");
        e
    })?;

    let records = parse_listing(&html, &config.base_url, &config.selectors)?;
    info!(count = records.len(), "[LISTING] Parsed trending projects");
    Ok(records)
}

/// Parses listing markup. Rows missing any of the six sub-elements are
/// skipped with a warning; they never abort the parse.
pub fn parse_listing(
    html: &str,
    base_url: &str,
    selectors: &ListingSelectors,
) -> Result<Vec<ProjectRecord>, DigestError> {
    let compiled = CompiledSelectors::compile(selectors)?;
    let origin = Url::parse(base_url).map_err(|e| {
        DigestError::ConfigInvalid(format!("listing base_url `{base_url}` is not a URL: {e}"))
    })?;
    let document = Html::parse_document(html);

    let mut records = Vec::new();
    for (index, row) in document.select(&compiled.row).enumerate() {
        let raw = RawRow::extract(row, &compiled, &origin);
        let missing = raw.missing_fields();
        if !missing.is_empty() {
            warn!(
                row = index + 1,
                missing = ?missing,
                name = raw.name.as_deref().unwrap_or_default(),
                "[LISTING] Skipping incomplete row"
            );
            continue;
        }
        if let Some(record) = raw.into_record() {
            debug!(row = index + 1, name = %record.name, "[LISTING] Accepted row");
            records.push(sanitize(record));
        }
    }
    Ok(records)
}

/// Normalises a record: collapses whitespace and substitutes sentinels for
/// empty fields. Applying it twice gives the same result as applying it once.
pub fn sanitize(record: ProjectRecord) -> ProjectRecord {
    ProjectRecord {
        name: or_sentinel(&record.name, UNKNOWN_PROJECT),
        url: record.url.trim().to_string(),
        description: or_sentinel(&record.description, NO_DESCRIPTION),
        language: or_sentinel(&record.language, UNSPECIFIED_LANGUAGE),
        stars: or_sentinel(&record.stars, ZERO_STARS),
        today_stars: or_sentinel(&record.today_stars, ZERO_STARS),
        detail: record.detail,
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub(crate) fn compile(css: &str) -> Result<Selector, DigestError> {
    Selector::parse(css).map_err(|e| DigestError::Selector {
        selector: css.to_string(),
        reason: format!("{e:?}"),
    })
}

fn or_sentinel(value: &str, sentinel: &str) -> String {
    let collapsed = collapse_whitespace(value);
    if collapsed.is_empty() {
        sentinel.to_string()
    } else {
        collapsed
    }
}

struct CompiledSelectors {
    row: Selector,
    name: Selector,
    description: Selector,
    language: Selector,
    stars: Selector,
    today_stars: Selector,
}

impl CompiledSelectors {
    fn compile(selectors: &ListingSelectors) -> Result<Self, DigestError> {
        Ok(Self {
            row: compile(&selectors.row)?,
            name: compile(&selectors.name)?,
            description: compile(&selectors.description)?,
            language: compile(&selectors.language)?,
            stars: compile(&selectors.stars)?,
            today_stars: compile(&selectors.today_stars)?,
        })
    }
}

/// Sub-element values of one row; `None` means the element was not found.
#[derive(Debug, Default)]
struct RawRow {
    name: Option<String>,
    url: Option<String>,
    description: Option<String>,
    language: Option<String>,
    stars: Option<String>,
    today_stars: Option<String>,
}

impl RawRow {
    fn extract(row: ElementRef<'_>, selectors: &CompiledSelectors, origin: &Url) -> Self {
        let first = |selector: &Selector| row.select(selector).next();
        let link = first(&selectors.name);
        Self {
            name: link.map(element_text),
            url: link
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| origin.join(href.trim()).ok())
                .map(|u| u.to_string()),
            description: first(&selectors.description).map(element_text),
            language: first(&selectors.language).map(element_text),
            stars: first(&selectors.stars).map(element_text),
            today_stars: first(&selectors.today_stars).map(element_text),
        }
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_none()),
            ("url", self.url.is_none()),
            ("description", self.description.is_none()),
            ("language", self.language.is_none()),
            ("stars", self.stars.is_none()),
            ("today_stars", self.today_stars.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, missing)| missing.then_some(field))
        .collect()
    }

    fn into_record(self) -> Option<ProjectRecord> {
        Some(ProjectRecord {
            name: self.name?,
            url: self.url?,
            description: self.description?,
            language: self.language?,
            stars: self.stars?,
            today_stars: self.today_stars?,
            detail: None,
        })
    }
}
