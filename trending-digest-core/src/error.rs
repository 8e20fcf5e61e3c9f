//! Error taxonomy for the digest pipeline.
//!
//! Whole-pipeline failures (config, listing fetch, generation, delivery to
//! nobody) surface as [`DigestError`] wrapped in a [`PipelineError`] that
//! records the stage. Per-item failures inside a batch (detail enrichment,
//! one recipient of many) are recorded in the batch result instead.

use std::time::Duration;
use thiserror::Error;

use crate::pipeline::Stage;

/// Boxed error returned by backend implementations (HTTP clients, mocks).
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("request to {url} timed out after {}ms", .timeout.as_millis())]
    FetchTimeout { url: String, timeout: Duration },

    #[error("request to {url} returned HTTP {status}")]
    FetchHttpError { url: String, status: u16 },

    #[error("request to {url} failed: {reason}")]
    FetchTransport { url: String, reason: String },

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("listing produced no usable records")]
    EmptyResult,

    #[error("unknown report template: {0}")]
    UnknownTemplate(String),

    #[error("report generation failed after {attempts} attempts: {last_error}")]
    GenerationExhausted { attempts: u32, last_error: String },

    #[error("delivery to {recipient} failed: {reason}")]
    DeliveryFailed { recipient: String, reason: String },

    #[error("none of the {attempted} recipients received the report")]
    NoSuccessfulDelivery { attempted: usize },
}

/// Terminal failure of a pipeline run, tagged with the stage that failed.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: DigestError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: DigestError) -> Self {
        Self { stage, source }
    }
}
