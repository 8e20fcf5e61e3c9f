//! Detail enrichment for a bounded prefix of the listing.
//!
//! Per-item failures never cross the batch boundary: a record whose detail
//! fetch fails comes out exactly as it went in, and its [`DetailOutcome`]
//! carries the reason. Output length always equals input length and order is
//! preserved. There is one outcome per attempted record, in listing order.

use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{EnrichConfig, EnrichMode};
use crate::contract::{DetailOutcome, DetailResult, PageFetcher, ProjectRecord, RepositoryDetail};
use crate::detail::parse_repository_detail;
use crate::error::DigestError;

/// Records after enrichment plus the per-item results of the attempted prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enriched {
    pub records: Vec<ProjectRecord>,
    pub outcomes: Vec<DetailOutcome>,
}

impl Enriched {
    /// Records passed through untouched, with no fetch attempted.
    pub fn passthrough(records: Vec<ProjectRecord>) -> Self {
        Self {
            records,
            outcomes: Vec::new(),
        }
    }

    pub fn attached(&self) -> usize {
        self.outcomes.iter().filter(|o| o.attached()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.attached()
    }
}

/// Enriches the first `config.max_count` records (all of them when it is 0).
pub async fn enrich<F>(
    fetcher: &F,
    records: Vec<ProjectRecord>,
    config: &EnrichConfig,
) -> Enriched
where
    F: PageFetcher + ?Sized,
{
    let limit = match config.max_count {
        0 => records.len(),
        n => n.min(records.len()),
    };
    let mut head = records;
    let tail = head.split_off(limit);

    info!(
        enriching = limit,
        passthrough = tail.len(),
        mode = ?config.mode,
        "[ENRICH] Fetching project details"
    );

    let attempts = match config.mode {
        EnrichMode::Sequential => {
            enrich_sequential(fetcher, head, config.timeout(), config.delay()).await
        }
        EnrichMode::Grouped { size } => {
            enrich_grouped(fetcher, head, size.max(1), config.timeout(), config.delay()).await
        }
    };

    let (mut records, outcomes): (Vec<_>, Vec<_>) = attempts.into_iter().unzip();
    records.extend(tail);
    let enriched = Enriched { records, outcomes };
    info!(
        attached = enriched.attached(),
        failed = enriched.failed(),
        attempted = limit,
        "[ENRICH] Detail enrichment finished"
    );
    enriched
}

/// One detail fetch + parse for a single project page.
pub async fn fetch_detail<F>(
    fetcher: &F,
    url: &str,
    timeout: Duration,
) -> Result<RepositoryDetail, DigestError>
where
    F: PageFetcher + ?Sized,
{
    let html = fetcher.fetch_page(url, timeout).await?;
    parse_repository_detail(&html, url)
}

async fn enrich_sequential<F>(
    fetcher: &F,
    records: Vec<ProjectRecord>,
    timeout: Duration,
    delay: Duration,
) -> Vec<(ProjectRecord, DetailOutcome)>
where
    F: PageFetcher + ?Sized,
{
    let mut out = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        out.push(attach(fetcher, record, timeout).await);
    }
    out
}

async fn enrich_grouped<F>(
    fetcher: &F,
    records: Vec<ProjectRecord>,
    size: usize,
    timeout: Duration,
    delay: Duration,
) -> Vec<(ProjectRecord, DetailOutcome)>
where
    F: PageFetcher + ?Sized,
{
    let mut out = Vec::with_capacity(records.len());
    let mut pending = records.into_iter().peekable();
    let mut group = 0usize;
    while pending.peek().is_some() {
        if group > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let batch: Vec<ProjectRecord> = pending.by_ref().take(size).collect();
        debug!(group = group + 1, size = batch.len(), "[ENRICH] Fetching group");
        // join_all waits for every member; a failed fetch never cancels its siblings.
        out.extend(join_all(batch.into_iter().map(|r| attach(fetcher, r, timeout))).await);
        group += 1;
    }
    out
}

async fn attach<F>(
    fetcher: &F,
    record: ProjectRecord,
    timeout: Duration,
) -> (ProjectRecord, DetailOutcome)
where
    F: PageFetcher + ?Sized,
{
    match fetch_detail(fetcher, &record.url, timeout).await {
        Ok(detail) => {
            debug!(url = %record.url, topics = detail.topics.len(), "[ENRICH] Detail attached");
            let outcome = DetailOutcome {
                url: record.url.clone(),
                result: DetailResult::Attached,
            };
            (record.with_detail(detail), outcome)
        }
        Err(e) => {
            warn!(
                url = %record.url,
                error = %e,
                "[ENRICH] Detail unavailable, keeping listing data"
            );
            let outcome = DetailOutcome {
                url: record.url.clone(),
                result: DetailResult::Failed {
                    error: e.to_string(),
                },
            };
            (record, outcome)
        }
    }
}
