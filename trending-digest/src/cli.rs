//! Command-line surface of trending-digest.
//!
//! Parses arguments with clap, builds the configuration through
//! [`load_config`](crate::load_config::load_config) and hands the concrete
//! backends to the core pipeline. Business logic stays in
//! `trending-digest-core`; this module only wires and reports.
//!
//! Subcommands:
//! - `run`: the full scrape, generate, deliver pipeline
//! - `preview`: listing + prompt + stats, no API keys needed
//! - `inspect`: detail JSON for individual project pages

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use trending_digest_core::config::EnrichConfig;
use trending_digest_core::contract::{DeliveryOutcome, DetailResult};
use trending_digest_core::enrich::fetch_detail;
use trending_digest_core::fetch::HttpPageFetcher;
use trending_digest_core::pipeline::{preview, run_digest};

use crate::gemini::GeminiClient;
use crate::load_config::{load_config, ApiKeys, Overrides};
use crate::mail::ResendClient;

#[derive(Parser)]
#[clap(
    name = "trending-digest",
    version,
    about = "Scrape trending GitHub projects, turn them into an HTML digest and email it"
)]
pub struct Cli {
    /// Debug-level logs and the full error cause chain on failure
    #[clap(long, short, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and deliver the report
    Run(DigestArgs),
    /// Fetch and format the listing, print the prompt and listing statistics
    Preview {
        #[clap(flatten)]
        args: DigestArgs,
        /// Also write the prompt to this file
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Print the detail data of one or more project pages as JSON
    Inspect {
        #[clap(required = true)]
        urls: Vec<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct DigestArgs {
    /// Path to a YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Language filter, e.g. `rust`
    #[clap(long)]
    pub language: Option<String>,
    /// Time window: daily, weekly or monthly
    #[clap(long)]
    pub since: Option<String>,
    /// Report template (htmlReport, enhancedReport, insightfulReport)
    #[clap(long)]
    pub template: Option<String>,
    /// Skip detail enrichment
    #[clap(long)]
    pub no_enrich: bool,
    /// Number of projects to enrich (0 = all)
    #[clap(long)]
    pub max_enrich: Option<usize>,
}

impl DigestArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            language: self.language.clone(),
            since: self.since.clone(),
            template: self.template.clone(),
            no_enrich: self.no_enrich,
            max_enrich: self.max_enrich,
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Run(args) => run_command(args).await,
        Commands::Preview { args, output } => preview_command(args, output).await,
        Commands::Inspect { urls } => inspect_command(urls).await,
    }
}

async fn run_command(args: DigestArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), &args.overrides())?;
    let keys = ApiKeys::from_env()?;
    tracing::info!(command = "run", "Starting digest run");

    let fetcher = HttpPageFetcher::new()?;
    let generator = GeminiClient::new(keys.gemini, &config.generation)
        .map_err(|e| anyhow::anyhow!("failed to construct Gemini client: {e}"))?;
    let mail = ResendClient::new(keys.resend, &config.delivery)
        .map_err(|e| anyhow::anyhow!("failed to construct Resend client: {e}"))?;

    let report = run_digest(&config, &fetcher, &generator, &mail).await?;

    println!(
        "Digest {} sent to {}/{} recipients: {} projects ({} enriched, {} detail failures), \
         template {}, {} bytes of HTML",
        report.run_id,
        report.delivered(),
        report.deliveries.len(),
        report.projects,
        report.enriched,
        report.detail_failures(),
        report.template,
        report.html_len
    );
    for detail in &report.details {
        if let DetailResult::Failed { error } = &detail.result {
            println!("  detail {}: {}", detail.url, error);
        }
    }
    for delivery in &report.deliveries {
        match &delivery.outcome {
            DeliveryOutcome::Delivered { id, path } => {
                println!("  ok     {} ({:?}, id {})", delivery.recipient, path, id)
            }
            DeliveryOutcome::Failed { error } => {
                println!("  failed {}: {}", delivery.recipient, error)
            }
        }
    }
    tracing::info!(command = "run", run_id = %report.run_id, "Digest run finished");
    Ok(())
}

async fn preview_command(args: DigestArgs, output: Option<PathBuf>) -> Result<()> {
    let config = load_config(args.config.as_deref(), &args.overrides())?;
    let fetcher = HttpPageFetcher::new()?;
    let preview = preview(&config, &fetcher).await?;

    println!("{}", preview.prompt);
    println!();
    println!("Template: {}", preview.template);
    println!("{}", preview.stats);

    if let Some(path) = output {
        fs::write(&path, &preview.prompt)
            .with_context(|| format!("failed to write prompt to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Prompt written to file");
    }
    Ok(())
}

async fn inspect_command(urls: Vec<String>) -> Result<()> {
    let fetcher = HttpPageFetcher::new()?;
    let timeout = Duration::from_millis(EnrichConfig::default().timeout_ms);
    let mut failed = 0usize;

    for url in &urls {
        match fetch_detail(&fetcher, url, timeout).await {
            Ok(detail) => {
                let json = serde_json::to_string_pretty(&detail)
                    .context("failed to serialise repository detail")?;
                println!("{json}");
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(url = %url, error = %e, "Inspection failed");
                eprintln!("{url}: {e}");
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} URLs could not be inspected", urls.len());
    }
    Ok(())
}
