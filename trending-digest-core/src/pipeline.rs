//! # pipeline: orchestration of one digest run
//!
//! A run walks a fixed sequence of stages:
//!
//! ```text
//! ValidatingConfig -> FetchingListing -> (EnrichingDetails) -> Formatting
//!     -> Generating -> Delivering -> Done
//! ```
//!
//! `Failed` is reachable from every stage. The first unrecovered error stops
//! the run and is returned as a [`PipelineError`] naming the stage. Per-item
//! failures (one detail page, one recipient) are absorbed by the stage that
//! owns them and never end the run on their own.
//!
//! [`preview`] runs the front half only (up to and including prompt
//! construction) and never touches the generation or delivery backends.
//!
//! All backends are passed in by reference so tests can drive the whole run
//! with mocks.

use std::fmt;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::DigestConfig;
use crate::contract::{
    DeliveryResult, DetailOutcome, MailBackend, PageFetcher, ProjectRecord, Report, TextGenerator,
};
use crate::deliver::Mailer;
use crate::enrich::{enrich, Enriched};
use crate::error::{DigestError, PipelineError};
use crate::format::prompt_text;
use crate::generate::ReportGenerator;
use crate::listing::fetch_listing;
use crate::stats::ListingStats;
use crate::template::TemplateKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidatingConfig,
    FetchingListing,
    EnrichingDetails,
    Formatting,
    Generating,
    Delivering,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ValidatingConfig => "validating config",
            Stage::FetchingListing => "fetching listing",
            Stage::EnrichingDetails => "enriching details",
            Stage::Formatting => "formatting",
            Stage::Generating => "generating report",
            Stage::Delivering => "delivering",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a successful run.
#[derive(Debug)]
pub struct DigestReport {
    pub run_id: Uuid,
    pub projects: usize,
    pub enriched: usize,
    pub template: TemplateKind,
    pub html_len: usize,
    /// One entry per record a detail fetch was attempted for.
    pub details: Vec<DetailOutcome>,
    pub deliveries: Vec<DeliveryResult>,
}

impl DigestReport {
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.success()).count()
    }

    pub fn detail_failures(&self) -> usize {
        self.details.iter().filter(|d| !d.attached()).count()
    }
}

/// Output of [`preview`]: everything a run would send to the generator.
#[derive(Debug)]
pub struct Preview {
    pub run_id: Uuid,
    pub template: TemplateKind,
    pub records: Vec<ProjectRecord>,
    pub details: Vec<DetailOutcome>,
    pub prompt: String,
    pub stats: ListingStats,
}

/// Tracks the current stage so failures can be tagged with it.
struct RunState {
    run_id: Uuid,
    stage: Stage,
}

impl RunState {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            stage: Stage::ValidatingConfig,
        }
    }

    fn enter(&mut self, next: Stage) {
        info!(run_id = %self.run_id, from = %self.stage, to = %next, "[DIGEST] Stage transition");
        self.stage = next;
    }

    fn fail(&mut self, source: DigestError) -> PipelineError {
        let failed_in = self.stage;
        error!(run_id = %self.run_id, stage = %failed_in, error = %source, "[DIGEST] Run failed");
        self.stage = Stage::Failed;
        PipelineError::new(failed_in, source)
    }
}

struct Collected {
    records: Vec<ProjectRecord>,
    details: Vec<DetailOutcome>,
    template: TemplateKind,
    prompt_text: String,
}

/// Runs the full pipeline: fetch, optional enrichment, generation, delivery.
pub async fn run_digest<F, G, M>(
    config: &DigestConfig,
    fetcher: &F,
    generator: &G,
    mail: &M,
) -> Result<DigestReport, PipelineError>
where
    F: PageFetcher + ?Sized,
    G: TextGenerator + ?Sized,
    M: MailBackend + ?Sized,
{
    let mut state = RunState::new();
    let span = info_span!("digest", run_id = %state.run_id);
    execute(config, fetcher, generator, mail, &mut state)
        .instrument(span)
        .await
}

/// Runs the stages up to prompt construction and returns the prompt with
/// listing statistics. Needs no generation or delivery backend.
pub async fn preview<F>(config: &DigestConfig, fetcher: &F) -> Result<Preview, PipelineError>
where
    F: PageFetcher + ?Sized,
{
    let mut state = RunState::new();
    let span = info_span!("digest", run_id = %state.run_id, mode = "preview");
    execute_preview(config, fetcher, &mut state)
        .instrument(span)
        .await
}

async fn execute<F, G, M>(
    config: &DigestConfig,
    fetcher: &F,
    generator: &G,
    mail: &M,
    state: &mut RunState,
) -> Result<DigestReport, PipelineError>
where
    F: PageFetcher + ?Sized,
    G: TextGenerator + ?Sized,
    M: MailBackend + ?Sized,
{
    info!("[DIGEST] Starting digest run");
    config.validate().map_err(|e| state.fail(e))?;
    config.trace_loaded();

    let collected = collect(config, fetcher, state).await?;

    state.enter(Stage::Generating);
    let html = ReportGenerator::from_config(generator, &config.generation)
        .generate(&collected.prompt_text, collected.template)
        .await
        .map_err(|e| state.fail(e))?;
    let report = Report {
        html,
        template: collected.template,
        project_count: collected.records.len(),
    };

    state.enter(Stage::Delivering);
    let mailer = Mailer::new(mail, &config.delivery);
    let deliveries = mailer.send_batch(&config.delivery.recipients, &report).await;
    if !deliveries.iter().any(DeliveryResult::success) {
        return Err(state.fail(DigestError::NoSuccessfulDelivery {
            attempted: deliveries.len(),
        }));
    }

    state.enter(Stage::Done);
    let summary = DigestReport {
        run_id: state.run_id,
        projects: collected.records.len(),
        enriched: collected.records.iter().filter(|r| r.is_enriched()).count(),
        template: report.template,
        html_len: report.html.len(),
        details: collected.details,
        deliveries,
    };
    info!(
        projects = summary.projects,
        enriched = summary.enriched,
        detail_failures = summary.detail_failures(),
        delivered = summary.delivered(),
        recipients = summary.deliveries.len(),
        "[DIGEST] Digest run complete"
    );
    Ok(summary)
}

async fn execute_preview<F>(
    config: &DigestConfig,
    fetcher: &F,
    state: &mut RunState,
) -> Result<Preview, PipelineError>
where
    F: PageFetcher + ?Sized,
{
    config.validate_listing().map_err(|e| state.fail(e))?;
    let collected = collect(config, fetcher, state).await?;
    let prompt = collected.template.build_prompt(&collected.prompt_text);
    let stats = ListingStats::collect(&collected.records, &collected.details, &prompt);
    state.enter(Stage::Done);
    Ok(Preview {
        run_id: state.run_id,
        template: collected.template,
        records: collected.records,
        details: collected.details,
        prompt,
        stats,
    })
}

/// Shared front half: listing, optional enrichment, formatting.
async fn collect<F>(
    config: &DigestConfig,
    fetcher: &F,
    state: &mut RunState,
) -> Result<Collected, PipelineError>
where
    F: PageFetcher + ?Sized,
{
    let template = TemplateKind::resolve(&config.generation.template);

    state.enter(Stage::FetchingListing);
    let records = fetch_listing(fetcher, &config.listing)
        .await
        .map_err(|e| state.fail(e))?;
    if records.is_empty() {
        return Err(state.fail(DigestError::EmptyResult));
    }

    let enriched = if config.enrich.enabled && template.requires_enrichment() {
        state.enter(Stage::EnrichingDetails);
        enrich(fetcher, records, &config.enrich).await
    } else {
        Enriched::passthrough(records)
    };
    let Enriched { records, outcomes } = enriched;

    state.enter(Stage::Formatting);
    let prompt_text = prompt_text(&records);
    Ok(Collected {
        records,
        details: outcomes,
        template,
        prompt_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_read_as_phrases() {
        assert_eq!(Stage::FetchingListing.to_string(), "fetching listing");
        let err = PipelineError::new(Stage::Generating, DigestError::EmptyResult);
        assert_eq!(
            err.to_string(),
            "generating report failed: listing produced no usable records"
        );
    }

    #[test]
    fn failing_moves_state_to_failed_and_keeps_origin() {
        let mut state = RunState::new();
        state.enter(Stage::Delivering);
        let err = state.fail(DigestError::NoSuccessfulDelivery { attempted: 2 });
        assert_eq!(err.stage, Stage::Delivering);
        assert_eq!(state.stage, Stage::Failed);
    }
}
